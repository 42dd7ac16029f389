//! Connectivity events and the LAN identity derived from them.

use serde::{Deserialize, Serialize};

/// Address reported when the device is on a LAN but its address could not be read.
pub const UNREACHABLE_ADDRESS: &str = "0.0.0.0";

/// Kind of network the device is attached to, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityKind {
    Wifi,
    Ethernet,
    Cellular,
    None,
    Unknown,
}

impl ConnectivityKind {
    /// Kinds on which other devices can reach us over the local network.
    pub fn is_lan(&self) -> bool {
        matches!(self, ConnectivityKind::Wifi | ConnectivityKind::Ethernet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityEvent {
    pub kind: ConnectivityKind,
    #[serde(default = "default_connected")]
    pub is_connected: bool,
}

fn default_connected() -> bool {
    true
}

impl ConnectivityEvent {
    pub fn new(kind: ConnectivityKind) -> Self {
        Self {
            kind,
            is_connected: true,
        }
    }
}

/// Connection as seen by a webview through the Network Information API.
///
/// `type` is missing on engines without `navigator.connection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebConnectionReport {
    #[serde(default, rename = "type")]
    pub connection_type: Option<String>,
    #[serde(default = "default_connected")]
    pub online: bool,
}

impl From<&WebConnectionReport> for ConnectivityEvent {
    /// Only an explicit `wifi` or `ethernet` counts as LAN. Being online says
    /// nothing about the kind of network.
    fn from(report: &WebConnectionReport) -> Self {
        let kind = if !report.online {
            ConnectivityKind::None
        } else {
            match report.connection_type.as_deref() {
                Some("wifi") => ConnectivityKind::Wifi,
                Some("ethernet") => ConnectivityKind::Ethernet,
                Some("cellular" | "wimax") => ConnectivityKind::Cellular,
                Some("none") => ConnectivityKind::None,
                _ => ConnectivityKind::Unknown,
            }
        };

        Self {
            kind,
            is_connected: report.online && kind != ConnectivityKind::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityKind {
    Lan,
    #[default]
    None,
}

/// The address other devices should use to reach the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub kind: IdentityKind,
    pub address: Option<String>,
}

impl NetworkIdentity {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn lan(address: impl Into<String>) -> Self {
        Self {
            kind: IdentityKind::Lan,
            address: Some(address.into()),
        }
    }

    /// On a LAN, but the previous address cannot be trusted and no new one is known.
    pub fn unreachable() -> Self {
        Self::lan(UNREACHABLE_ADDRESS)
    }
}
