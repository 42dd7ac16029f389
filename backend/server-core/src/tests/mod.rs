mod config;
mod listener;
mod navigation;
mod observable;
mod script;
mod sidecar;
mod watchdog;
