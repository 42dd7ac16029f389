mod endpoint_builder;
mod network;
