pub mod network;
pub mod server;
pub mod session;
pub mod settings;
