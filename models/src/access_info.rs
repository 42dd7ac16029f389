use crate::ServerState;

use serde::Serialize;

/// Everything the status screen shows about how to reach the server.
///
/// Credentials are only populated while the server is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessInfo {
    pub state: ServerState,
    pub username: Option<String>,
    pub password: Option<String>,
    pub lan_address: Option<String>,
    pub loopback_address: String,
    pub port: u16,
    pub webdav_path: String,
}
