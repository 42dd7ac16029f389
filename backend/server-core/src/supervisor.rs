//! Wires the lifecycle controller, credential resolver, network probe and
//! session bridge together around one shared server-state subscription.

use crate::config::AppConfig;
use crate::credentials::CredentialResolver;
use crate::error::CoreError;
use crate::error::lifecycle::LifecycleError;
use crate::lifecycle::liveness::LivenessProbe;
use crate::lifecycle::{InitOutcome, LifecycleController};
use crate::network::{ConnectivitySubscription, LanAddressQuery, NetworkIdentityProbe};
use crate::platform::{ExternalOpener, Notifier};
use crate::process::ServerProcess;
use crate::session::SessionTokenBridge;
use crate::session::navigation::NavigationGuard;
use crate::{DEFAULT_ADMIN_PASSWORD, SERVER_HOSTNAME, SERVER_PORT, WEBDAV_PATH};

use common::ErrorLocation;
use models::{AccessInfo, ConnectivityEvent, ServerEndpoint, ServerEndpointBuilder, ServerState};

use std::panic::Location;
use std::sync::Arc;

use futures_util::Stream;
use log::{debug, warn};
use tokio::task::JoinHandle;

/// Platform services the supervisor depends on.
#[derive(Clone)]
pub struct Services {
    pub process: Arc<dyn ServerProcess>,
    pub lan_query: Arc<dyn LanAddressQuery>,
    pub notifier: Arc<dyn Notifier>,
    pub opener: Arc<dyn ExternalOpener>,
}

pub struct Supervisor {
    config: AppConfig,
    endpoint: ServerEndpoint,
    lifecycle: Arc<LifecycleController>,
    credentials: Arc<CredentialResolver>,
    network: Arc<NetworkIdentityProbe>,
    session: Arc<SessionTokenBridge>,
    navigation: Arc<NavigationGuard>,
}

impl Supervisor {
    /// Supervisor for the server on its fixed loopback endpoint.
    #[track_caller]
    pub fn new(config: AppConfig, services: Services) -> Result<Self, CoreError> {
        let endpoint = ServerEndpointBuilder::default()
            .with_host(SERVER_HOSTNAME)
            .with_port(SERVER_PORT)
            .build()?;

        Self::with_endpoint(config, endpoint, services)
    }

    #[track_caller]
    pub fn with_endpoint(
        config: AppConfig,
        endpoint: ServerEndpoint,
        services: Services,
    ) -> Result<Self, CoreError> {
        let liveness = LivenessProbe::new(&endpoint, config.startup.liveness()).map_err(|source| {
            LifecycleError::NotReady {
                location: ErrorLocation::from(Location::caller()),
                source,
            }
        })?;

        let lifecycle = Arc::new(LifecycleController::new(
            Arc::clone(&services.process),
            Arc::clone(&services.notifier),
            liveness,
        ));

        let credentials = Arc::new(CredentialResolver::new(
            Arc::clone(&services.process),
            lifecycle.subscribe(),
            DEFAULT_ADMIN_PASSWORD,
        ));

        let network = Arc::new(NetworkIdentityProbe::new(Arc::clone(&services.lan_query)));

        let session = Arc::new(SessionTokenBridge::new(
            Arc::clone(&services.process),
            lifecycle.subscribe(),
        ));

        let navigation = Arc::new(NavigationGuard::new(
            &config.browser.external_schemes,
            Arc::clone(&services.opener),
            Arc::clone(&services.notifier),
        ));

        Ok(Self {
            config,
            endpoint,
            lifecycle,
            credentials,
            network,
            session,
            navigation,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleController> {
        &self.lifecycle
    }

    pub fn credentials(&self) -> &Arc<CredentialResolver> {
        &self.credentials
    }

    pub fn network(&self) -> &Arc<NetworkIdentityProbe> {
        &self.network
    }

    pub fn session(&self) -> &Arc<SessionTokenBridge> {
        &self.session
    }

    pub fn navigation(&self) -> &Arc<NavigationGuard> {
        &self.navigation
    }

    /// Once per app activation.
    pub async fn activate(&self) -> InitOutcome {
        self.lifecycle.init(self.config.settings.startup()).await
    }

    /// Switch semantics: start when stopped, stop when running.
    pub async fn toggle(&self) -> ServerState {
        match self.lifecycle.state() {
            ServerState::Running => self.lifecycle.stop().await,
            ServerState::Stopped => self.lifecycle.start().await,
            ServerState::Starting => {
                debug!("Toggle ignored while the server is starting");
                ServerState::Starting
            }
        }
    }

    /// Keep credentials and session token in step with the server state.
    ///
    /// On `Running` both are fetched; on `Stopped` both are dropped.
    pub fn follow_server_state(&self) -> JoinHandle<()> {
        let mut state_rx = self.lifecycle.subscribe();
        let credentials = Arc::clone(&self.credentials);
        let session = Arc::clone(&self.session);

        tokio::spawn(async move {
            loop {
                let state = *state_rx.borrow_and_update();
                match state {
                    ServerState::Running => {
                        if let Err(e) = credentials.resolve().await {
                            warn!("Could not resolve credentials: {e}");
                        }
                        session.refresh().await;
                    }
                    ServerState::Stopped => {
                        credentials.invalidate();
                        session.invalidate();
                    }
                    ServerState::Starting => {}
                }

                if state_rx.changed().await.is_err() {
                    debug!("Server state channel closed");
                    break;
                }
            }
        })
    }

    /// The hosting view regained focus.
    pub async fn on_focus(&self) -> ServerState {
        let state = self.lifecycle.refresh().await;
        if !state.is_running() {
            return state;
        }

        if let Err(e) = self.credentials.resolve().await {
            warn!("Could not resolve credentials on focus: {e}");
        }
        self.session.refresh().await;

        state
    }

    pub fn watch_connectivity<S>(&self, events: S) -> ConnectivitySubscription
    where
        S: Stream<Item = ConnectivityEvent> + Send + 'static,
    {
        self.network.watch(events)
    }

    /// Snapshot for the status screen.
    pub fn access_info(&self) -> AccessInfo {
        let state = self.lifecycle.state();
        let credentials = self.credentials.current();

        AccessInfo {
            state,
            username: credentials.as_ref().map(|c| c.username.clone()),
            password: credentials.as_ref().map(|c| c.password.as_str().to_string()),
            lan_address: self.network.current().address,
            loopback_address: self.endpoint.host.clone(),
            port: self.endpoint.port,
            webdav_path: WEBDAV_PATH.to_string(),
        }
    }

    /// URL the embedded browser loads for a server-relative path.
    pub fn browser_url(&self, path: &str) -> String {
        self.endpoint.url_for(path)
    }
}
