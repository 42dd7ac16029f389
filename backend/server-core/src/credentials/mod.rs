//! Admin credentials of the embedded server.
//!
//! Resolved lazily once the server is running and re-resolved on every focus
//! so changes made from the web UI show up. The cache is cleared as soon as
//! the server stops.

use crate::error::credentials::CredentialError;
use crate::observable::StateCell;
use crate::process::ServerProcess;

use common::ErrorLocation;
use models::{Credentials, ServerState};

use std::panic::Location;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::watch;

pub struct CredentialResolver {
    process: Arc<dyn ServerProcess>,
    server_state: watch::Receiver<ServerState>,
    default_password: String,
    credentials: StateCell<Option<Credentials>>,
}

impl CredentialResolver {
    pub fn new(
        process: Arc<dyn ServerProcess>,
        server_state: watch::Receiver<ServerState>,
        default_password: impl Into<String>,
    ) -> Self {
        Self {
            process,
            server_state,
            default_password: default_password.into(),
            credentials: StateCell::new(None),
        }
    }

    fn is_server_running(&self) -> bool {
        self.server_state.borrow().is_running()
    }

    /// Last resolved credentials, or `None` while the server is not running.
    pub fn current(&self) -> Option<Credentials> {
        if self.is_server_running() {
            self.credentials.get()
        } else {
            None
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Credentials>> {
        self.credentials.subscribe()
    }

    pub fn invalidate(&self) {
        if self.credentials.replace_if_changed(None) {
            debug!("Credentials cleared");
        }
    }

    /// Query the server for its admin account.
    ///
    /// On first boot the server has no password yet; the default one is then
    /// provisioned through the server and returned.
    pub async fn resolve(&self) -> Result<Credentials, CredentialError> {
        if !self.is_server_running() {
            return Err(CredentialError::NotRunning {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let password = self
            .process
            .admin_password()
            .await
            .map_err(|source| CredentialError::Query {
                location: ErrorLocation::from(Location::caller()),
                source,
            })?;

        let username = self
            .process
            .admin_username()
            .await
            .map_err(|source| CredentialError::Query {
                location: ErrorLocation::from(Location::caller()),
                source,
            })?;

        let password = if password.is_empty() {
            info!("No admin password set yet, provisioning the default one");
            self.process
                .set_admin_password(&self.default_password)
                .await
                .map_err(|source| CredentialError::Bootstrap {
                    location: ErrorLocation::from(Location::caller()),
                    source,
                })?;
            self.default_password.clone()
        } else {
            password
        };

        // The server may have been stopped while we were waiting on it.
        if !self.is_server_running() {
            self.invalidate();
            return Err(CredentialError::NotRunning {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let credentials = Credentials::new(username, password);
        self.credentials.replace_if_changed(Some(credentials.clone()));
        debug!("Credentials resolved for '{}'", credentials.username);

        Ok(credentials)
    }
}
