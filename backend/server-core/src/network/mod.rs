//! LAN identity of the device, derived from connectivity events.
//!
//! Independent of the server lifecycle: failures here are logged and turned
//! into a well-defined identity, never propagated.

use crate::error::network::NetworkError;
use crate::observable::StateCell;

use common::ErrorLocation;
use models::{ConnectivityEvent, NetworkIdentity};

use std::panic::Location;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Platform query for the device's address on the local network.
#[async_trait]
pub trait LanAddressQuery: Send + Sync {
    async fn lan_address(&self) -> Result<String, NetworkError>;
}

/// Address of the interface carrying the default route.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalIpQuery;

#[async_trait]
impl LanAddressQuery for LocalIpQuery {
    async fn lan_address(&self) -> Result<String, NetworkError> {
        let ip = local_ip_address::local_ip().map_err(|e| NetworkError::AddressQuery {
            message: format!("Failed to read local IP address: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

        if ip.is_loopback() || ip.is_unspecified() {
            return Err(NetworkError::NoAddress {
                message: format!("Only a non-routable address is available: {ip}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(ip.to_string())
    }
}

pub struct NetworkIdentityProbe {
    query: Arc<dyn LanAddressQuery>,
    identity: StateCell<NetworkIdentity>,
}

impl NetworkIdentityProbe {
    pub fn new(query: Arc<dyn LanAddressQuery>) -> Self {
        Self {
            query,
            identity: StateCell::new(NetworkIdentity::none()),
        }
    }

    pub fn current(&self) -> NetworkIdentity {
        self.identity.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkIdentity> {
        self.identity.subscribe()
    }

    /// Recompute the identity for a connectivity change.
    ///
    /// A failed lookup on a LAN yields the unreachable sentinel rather than
    /// keeping the previous address, which may belong to the old network.
    pub async fn handle_event(&self, event: ConnectivityEvent) -> NetworkIdentity {
        let identity = if event.is_connected && event.kind.is_lan() {
            match self.query.lan_address().await {
                Ok(address) => NetworkIdentity::lan(address),
                Err(e) => {
                    warn!("LAN address lookup failed: {e}");
                    NetworkIdentity::unreachable()
                }
            }
        } else {
            NetworkIdentity::none()
        };

        if self.identity.replace_if_changed(identity.clone()) {
            debug!("Network identity changed to {:?}", identity.address);
        }

        identity
    }

    /// Follow a connectivity event stream until it ends or the subscription is dropped.
    pub fn watch<S>(self: &Arc<Self>, events: S) -> ConnectivitySubscription
    where
        S: Stream<Item = ConnectivityEvent> + Send + 'static,
    {
        let probe = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut events = Box::pin(events);
            while let Some(event) = events.next().await {
                probe.handle_event(event).await;
            }
            debug!("Connectivity event stream ended");
        });

        ConnectivitySubscription { task }
    }
}

/// Keeps a connectivity subscription alive; dropping it unsubscribes.
pub struct ConnectivitySubscription {
    task: JoinHandle<()>,
}

impl ConnectivitySubscription {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ConnectivitySubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
