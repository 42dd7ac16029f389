//! Server lifecycle: start, stop, first-launch initialization.
//!
//! The controller is the only writer of [`ServerState`]. Transitions are
//! guarded by the current state, so overlapping `start()` or `stop()` calls
//! collapse into one in-flight transition per direction. Failures are logged
//! and leave the state at its last valid value; nothing here is fatal.

pub mod liveness;

use crate::error::lifecycle::LifecycleError;
use crate::observable::StateCell;
use crate::platform::Notifier;
use crate::process::ServerProcess;

use liveness::LivenessProbe;

use common::ErrorLocation;
use models::ServerState;

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use tokio::sync::watch;

pub const RUNNING_NOTIFICATION_TITLE: &str = "AListServer";
pub const RUNNING_NOTIFICATION_BODY: &str = "The server is running";
pub const INIT_FAILED_NOTICE: &str = "AList initialization failed";

/// Persisted user settings that affect what happens on activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupSettings {
    pub auto_run: bool,
    pub restore_on_launch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Initialized; the user starts the server manually.
    Ready,
    /// A server from an earlier launch was already up and has been adopted.
    AlreadyRunning,
    /// Auto-run kicked off `start()`, which ended in the given state.
    AutoStarted(ServerState),
    /// Initialization failed and the user has been told.
    Failed,
}

pub struct LifecycleController {
    process: Arc<dyn ServerProcess>,
    notifier: Arc<dyn Notifier>,
    liveness: LivenessProbe,
    state: StateCell<ServerState>,
    stop_in_flight: AtomicBool,
}

impl LifecycleController {
    pub fn new(
        process: Arc<dyn ServerProcess>,
        notifier: Arc<dyn Notifier>,
        liveness: LivenessProbe,
    ) -> Self {
        Self {
            process,
            notifier,
            liveness,
            state: StateCell::new(ServerState::Stopped),
            stop_in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ServerState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Start the server and wait for it to answer `/ping`.
    ///
    /// Returns the resulting state. Errors are logged and swallowed: the
    /// state goes back to `Stopped` so the user can retry.
    pub async fn start(&self) -> ServerState {
        match self.try_start().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to start server: {e}");
                self.state()
            }
        }
    }

    /// Like [`start`](Self::start) but reports the failure to the caller.
    pub async fn try_start(&self) -> Result<ServerState, LifecycleError> {
        let claimed = self.state.transition(|state| {
            if state.is_stopped() {
                *state = ServerState::Starting;
                true
            } else {
                false
            }
        });

        if !claimed {
            let current = self.state();
            debug!("Start ignored: server is {current}");
            return Ok(current);
        }

        info!("Starting server");

        if let Err(source) = self.process.start().await {
            self.state.set(ServerState::Stopped);
            return Err(LifecycleError::Start {
                location: ErrorLocation::from(Location::caller()),
                source,
            });
        }

        if let Err(source) = self.liveness.wait_until_ready().await {
            self.state.set(ServerState::Stopped);
            return Err(LifecycleError::NotReady {
                location: ErrorLocation::from(Location::caller()),
                source,
            });
        }

        self.state.set(ServerState::Running);
        info!("Server is running ({})", self.liveness.url());
        Ok(ServerState::Running)
    }

    /// Stop the server. On failure the state is left unchanged.
    pub async fn stop(&self) -> ServerState {
        match self.try_stop().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to stop server: {e}");
                self.state()
            }
        }
    }

    pub async fn try_stop(&self) -> Result<ServerState, LifecycleError> {
        let current = self.state();
        if !current.is_running() {
            debug!("Stop ignored: server is {current}");
            return Ok(current);
        }

        if self.stop_in_flight.swap(true, Ordering::SeqCst) {
            debug!("Stop ignored: another stop is in progress");
            return Ok(current);
        }

        info!("Stopping server");
        let outcome = match self.process.stop().await {
            Ok(()) => {
                self.state.transition(|state| {
                    if state.is_running() {
                        *state = ServerState::Stopped;
                        true
                    } else {
                        false
                    }
                });
                info!("Server stopped");
                Ok(ServerState::Stopped)
            }
            Err(source) => Err(LifecycleError::Stop {
                location: ErrorLocation::from(Location::caller()),
                source,
            }),
        };

        // The guard stays held until the state reflects the stop.
        self.stop_in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    /// Reconcile the published state with what the process reports.
    ///
    /// Covers a server that died on its own or one adopted from an earlier
    /// launch. A `Starting` state is left for `start()` to resolve.
    pub async fn refresh(&self) -> ServerState {
        let running = match self.process.is_running().await {
            Ok(running) => running,
            Err(e) => {
                warn!("Could not query server status: {e}");
                return self.state();
            }
        };

        self.state.transition(|state| match (*state, running) {
            (ServerState::Running, false) => {
                warn!("Server is no longer running");
                *state = ServerState::Stopped;
                true
            }
            (ServerState::Stopped, true) => {
                info!("Found a running server, adopting it");
                *state = ServerState::Running;
                true
            }
            _ => false,
        });

        self.state()
    }

    /// Once-per-activation initialization.
    ///
    /// Restoring from backup is best-effort and never blocks startup. With
    /// auto-run enabled and no server up, starts it and schedules a
    /// notification. If initialization itself fails the user gets a notice.
    pub async fn init(&self, settings: StartupSettings) -> InitOutcome {
        match self.try_init(settings).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Server initialization failed: {e}");
                let notice = match &e {
                    LifecycleError::Init { source, .. } => {
                        format!("{INIT_FAILED_NOTICE}: {}", source.user_message())
                    }
                    _ => INIT_FAILED_NOTICE.to_string(),
                };
                self.notifier.show_notice(&notice);
                InitOutcome::Failed
            }
        }
    }

    async fn try_init(&self, settings: StartupSettings) -> Result<InitOutcome, LifecycleError> {
        self.process
            .init()
            .await
            .map_err(|source| LifecycleError::Init {
                location: ErrorLocation::from(Location::caller()),
                source,
            })?;

        if settings.restore_on_launch
            && let Err(e) = self.process.restore().await
        {
            warn!("Restore from backup failed, continuing without it: {e}");
        }

        let running = self
            .process
            .is_running()
            .await
            .map_err(|source| LifecycleError::Init {
                location: ErrorLocation::from(Location::caller()),
                source,
            })?;

        if running {
            self.state.transition(|state| {
                if state.is_stopped() {
                    *state = ServerState::Running;
                    true
                } else {
                    false
                }
            });
            info!("Server already running at activation");
            return Ok(InitOutcome::AlreadyRunning);
        }

        if !settings.auto_run {
            return Ok(InitOutcome::Ready);
        }

        info!("Auto-run enabled, starting server");
        let state = self.start().await;

        if let Err(e) = self
            .notifier
            .schedule_notification(RUNNING_NOTIFICATION_TITLE, RUNNING_NOTIFICATION_BODY)
        {
            warn!("Failed to schedule running notification: {e}");
        }

        Ok(InitOutcome::AutoStarted(state))
    }
}
