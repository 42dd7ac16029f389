use crate::error::AppError;

use server_core::config::{AppConfig, UserSettings};
use server_core::network::ConnectivitySubscription;
use server_core::supervisor::Supervisor;

use common::ErrorLocation;
use models::{AccessInfo, ConnectivityEvent};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

const CONNECTIVITY_CHANNEL_CAPACITY: usize = 16;

/// Application state managed by Tauri.
///
/// Owns the supervisor and the background tasks that keep the status
/// screen current. Must be created inside a Tokio runtime; the tasks are
/// aborted when the state is dropped.
pub struct AppState {
    supervisor: Arc<Supervisor>,
    config_dir: PathBuf,
    connectivity_tx: mpsc::Sender<ConnectivityEvent>,
    _connectivity: ConnectivitySubscription,
    tasks: Vec<JoinHandle<()>>,
}

impl AppState {
    /// Wire up background tasks. `publish` receives a fresh [`AccessInfo`]
    /// whenever the server state, credentials, network identity or session
    /// token change.
    pub fn new<P>(supervisor: Arc<Supervisor>, config_dir: impl Into<PathBuf>, publish: P) -> Self
    where
        P: Fn(AccessInfo) + Send + Sync + 'static,
    {
        let (connectivity_tx, connectivity_rx) = mpsc::channel(CONNECTIVITY_CHANNEL_CAPACITY);
        let connectivity = supervisor.watch_connectivity(ReceiverStream::new(connectivity_rx));

        let follower = supervisor.follow_server_state();
        let publisher = spawn_status_publisher(Arc::clone(&supervisor), publish);

        info!("App state initialized");

        Self {
            supervisor,
            config_dir: config_dir.into(),
            connectivity_tx,
            _connectivity: connectivity,
            tasks: vec![follower, publisher],
        }
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Forward a platform connectivity change to the network probe.
    pub async fn connectivity_changed(&self, event: ConnectivityEvent) -> Result<(), AppError> {
        debug!("Connectivity changed: {event:?}");
        self.connectivity_tx
            .send(event)
            .await
            .map_err(|e| AppError::App {
                message: format!("Connectivity watcher stopped: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Persisted user settings; defaults when the config cannot be read.
    pub fn settings(&self) -> UserSettings {
        AppConfig::load_or_default(&self.config_dir).settings
    }

    /// Persist new user settings. They apply from the next activation.
    pub fn update_settings(&self, settings: UserSettings) -> Result<UserSettings, AppError> {
        let mut config = AppConfig::load(&self.config_dir).map_err(|e| AppError::Config {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        config.settings = settings.clone();
        config.save(&self.config_dir).map_err(|e| AppError::Config {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            "Settings saved: auto_run={}, restore_on_launch={}",
            settings.auto_run, settings.restore_on_launch
        );
        Ok(settings)
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_status_publisher<P>(supervisor: Arc<Supervisor>, publish: P) -> JoinHandle<()>
where
    P: Fn(AccessInfo) + Send + Sync + 'static,
{
    let mut state_rx = supervisor.lifecycle().subscribe();
    let mut credentials_rx = supervisor.credentials().subscribe();
    let mut identity_rx = supervisor.network().subscribe();
    let mut token_rx = supervisor.session().subscribe_token();

    tokio::spawn(async move {
        loop {
            let closed = tokio::select! {
                changed = state_rx.changed() => changed.is_err(),
                changed = credentials_rx.changed() => changed.is_err(),
                changed = identity_rx.changed() => changed.is_err(),
                changed = token_rx.changed() => changed.is_err(),
            };

            if closed {
                warn!("Status source closed, publisher stopping");
                break;
            }

            publish(supervisor.access_info());
        }
    })
}
