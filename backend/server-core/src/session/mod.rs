//! Authenticated session bridge into the embedded browser.
//!
//! The web UI reads its auth token from `localStorage`. The bridge fetches a
//! fresh token and gets it into the browser before any page script runs:
//!
//! - no live browser: the token script is staged, and [`mount`] hands it to
//!   the browser factory as a pre-load script
//! - live browser: the script is executed in place, no reload
//!
//! The bridge also owns the reload of the live page, on request or when
//! [`check_browser`] finds that its content process is gone.
//!
//! [`mount`]: SessionTokenBridge::mount
//! [`check_browser`]: SessionTokenBridge::check_browser

pub mod navigation;
pub mod script;
pub mod watchdog;

use crate::error::session::SessionError;
use crate::observable::StateCell;
use crate::process::ServerProcess;

use script::{NOOP_SCRIPT, token_script};
use watchdog::{BrowserHealth, ContentWatchdog, heartbeat_script};

use common::{ErrorLocation, RedactedSecret};
use models::ServerState;

use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;

/// A live embedded browser instance.
pub trait BrowserContext: Send + Sync {
    fn execute_script(&self, script: &str) -> Result<(), SessionError>;

    /// Reload the current page. Pre-load scripts run again.
    fn reload(&self) -> Result<(), SessionError>;
}

/// How a refresh reached the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// Executed against the live browser.
    Executed,
    /// Staged for the next mount.
    Staged,
    /// Token fetch failed; the no-op script was staged instead.
    Degraded,
    /// Server not running; nothing done.
    Skipped,
}

#[derive(Default)]
struct BrowserSlot {
    browser: Option<Arc<dyn BrowserContext>>,
    staged: Option<String>,
}

pub struct SessionTokenBridge {
    process: Arc<dyn ServerProcess>,
    server_state: watch::Receiver<ServerState>,
    token: StateCell<Option<RedactedSecret>>,
    slot: Mutex<BrowserSlot>,
    watchdog: ContentWatchdog,
}

impl SessionTokenBridge {
    pub fn new(process: Arc<dyn ServerProcess>, server_state: watch::Receiver<ServerState>) -> Self {
        Self {
            process,
            server_state,
            token: StateCell::new(None),
            slot: Mutex::new(BrowserSlot::default()),
            watchdog: ContentWatchdog::new(),
        }
    }

    fn slot(&self) -> MutexGuard<'_, BrowserSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_server_running(&self) -> bool {
        self.server_state.borrow().is_running()
    }

    /// Current session token; `None` while the server is not running.
    pub fn token(&self) -> Option<RedactedSecret> {
        if self.is_server_running() {
            self.token.get()
        } else {
            None
        }
    }

    pub fn subscribe_token(&self) -> watch::Receiver<Option<RedactedSecret>> {
        self.token.subscribe()
    }

    /// Script a new browser must run before its first page load.
    pub fn staged_script(&self) -> Option<String> {
        self.slot().staged.clone()
    }

    pub fn has_browser(&self) -> bool {
        self.slot().browser.is_some()
    }

    /// True once a browser can be created without racing the token.
    pub fn is_mountable(&self) -> bool {
        self.is_server_running() && self.slot().staged.is_some()
    }

    /// Fetch a fresh token and deliver it to the browser.
    pub async fn refresh(&self) -> Injection {
        if !self.is_server_running() {
            debug!("Token refresh skipped: server not running");
            return Injection::Skipped;
        }

        let token = match self.process.admin_token().await {
            Ok(token) => token,
            Err(source) => {
                let err = SessionError::TokenFetch {
                    location: ErrorLocation::from(Location::caller()),
                    source,
                };
                error!("Failed to refresh session token: {err}");
                self.token.set(None);
                self.slot().staged = Some(NOOP_SCRIPT.to_string());
                return Injection::Degraded;
            }
        };

        if !self.is_server_running() {
            debug!("Server stopped while fetching the token, discarding it");
            return Injection::Skipped;
        }

        let script = token_script(&token);
        self.token.set(Some(RedactedSecret::new(token)));
        self.deliver(script)
    }

    fn deliver(&self, script: String) -> Injection {
        let mut slot = self.slot();

        let outcome = match slot.browser.as_ref() {
            Some(browser) => match browser.execute_script(&script) {
                Ok(()) => {
                    debug!("Session token injected into live browser");
                    Injection::Executed
                }
                Err(e) => {
                    warn!("In-place token injection failed, staging it instead: {e}");
                    Injection::Staged
                }
            },
            None => {
                debug!("Session token staged for next browser mount");
                Injection::Staged
            }
        };

        // Kept even after in-place execution: a re-created browser needs the latest token.
        slot.staged = Some(script);
        outcome
    }

    /// Create the live browser with the staged script as its pre-load script.
    ///
    /// `create` runs while the bridge is locked, so no refresh can slip in
    /// between reading the staged script and registering the new instance.
    pub fn mount<B, F>(&self, create: F) -> Result<Arc<B>, SessionError>
    where
        B: BrowserContext + 'static,
        F: FnOnce(&str) -> Result<Arc<B>, SessionError>,
    {
        if !self.is_server_running() {
            return Err(SessionError::MountRefused {
                message: String::from("server is not running"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut slot = self.slot();
        let script = slot
            .staged
            .clone()
            .ok_or_else(|| SessionError::MountRefused {
                message: String::from("no session script staged yet"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let browser = create(&script)?;
        let live: Arc<dyn BrowserContext> = browser.clone();
        slot.browser = Some(live);
        info!("Embedded browser mounted");

        Ok(browser)
    }

    /// Forget the live browser (its view was closed).
    pub fn detach(&self) {
        if self.slot().browser.take().is_some() {
            debug!("Embedded browser detached");
        }
    }

    /// Reload the live browser. `Ok(false)` when there is none.
    pub fn reload(&self) -> Result<bool, SessionError> {
        let Some(browser) = self.live_browser() else {
            debug!("Reload requested without a live browser");
            return Ok(false);
        };
        browser.reload()?;
        info!("Embedded browser reloaded");
        Ok(true)
    }

    /// Answer from the page to heartbeat `seq`.
    pub fn acknowledge_heartbeat(&self, seq: u64) -> bool {
        let answered = self.watchdog.acknowledge(seq);
        if !answered {
            debug!("Ignoring stale browser heartbeat {seq}");
        }
        answered
    }

    /// Send a heartbeat to the live page and reload it if no answer arrives
    /// within `timeout`.
    pub async fn check_browser(&self, timeout: Duration) -> BrowserHealth {
        let Some(browser) = self.live_browser() else {
            return BrowserHealth::Absent;
        };

        let seq = self.watchdog.arm();
        if let Err(e) = browser.execute_script(&heartbeat_script(seq)) {
            warn!("Heartbeat could not reach the browser: {e}");
        }
        drop(browser);

        tokio::time::sleep(timeout).await;
        if !self.watchdog.expire(seq) {
            return BrowserHealth::Alive;
        }

        warn!("Browser did not answer heartbeat {seq} within {timeout:?}, reloading it");
        match self.reload() {
            Ok(true) => BrowserHealth::Recovered,
            Ok(false) => BrowserHealth::Absent,
            Err(e) => {
                error!("Failed to reload unresponsive browser: {e}");
                self.detach();
                BrowserHealth::Lost
            }
        }
    }

    fn live_browser(&self) -> Option<Arc<dyn BrowserContext>> {
        self.slot().browser.clone()
    }

    /// Drop token and staged script; called when the server stops.
    pub fn invalidate(&self) {
        self.token.set(None);
        self.slot().staged = None;
        debug!("Session token invalidated");
    }
}
