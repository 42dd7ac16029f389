mod credentials;
mod fakes;
mod lifecycle;
mod liveness;
mod navigation;
mod network;
mod session;
mod sidecar;
mod supervisor;
