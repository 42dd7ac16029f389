pub mod config;
pub mod credentials;
pub mod error;
pub mod lifecycle;
pub mod network;
pub mod observable;
pub mod platform;
pub mod process;
pub mod session;
pub mod supervisor;

#[cfg(test)]
mod tests;

pub const ALIST_BINARY: &str = "alist";
pub const SERVER_HOSTNAME: &str = "127.0.0.1";
pub const SERVER_PORT: u16 = 5244;
pub const SERVER_BASE_URL: &str =
    const_format::concatcp!("http://", SERVER_HOSTNAME, ":", SERVER_PORT);
pub const PING_ENDPOINT: &str = "/ping";
pub const WEBDAV_PATH: &str = "dav";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
pub const USER_AGENT_APPLICATION_NAME: &str = "AListServer";
