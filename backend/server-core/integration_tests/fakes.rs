//! In-memory stand-ins for the platform seams, with call counters.

use common::ErrorLocation;
use server_core::config::AppConfig;
use server_core::error::network::NetworkError;
use server_core::error::platform::PlatformError;
use server_core::error::process::ProcessError;
use server_core::error::session::SessionError;
use server_core::network::LanAddressQuery;
use server_core::platform::{ExternalOpener, Notifier};
use server_core::process::ServerProcess;
use server_core::session::BrowserContext;
use server_core::supervisor::{Services, Supervisor};

use models::ServerEndpointBuilder;

use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[track_caller]
fn command_error(message: &str) -> ProcessError {
    ProcessError::Command {
        message: message.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

// ----------------------------------------------------------------------------
// Server process
// ----------------------------------------------------------------------------

pub struct FakeServer {
    pub running: AtomicBool,
    pub password: Mutex<String>,
    pub username: Mutex<String>,
    /// `None` makes `admin_token()` fail.
    pub token: Mutex<Option<String>>,
    pub start_delay: Mutex<Duration>,
    pub stop_delay: Mutex<Duration>,

    pub fail_init: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub fail_restore: AtomicBool,

    pub init_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub restore_calls: AtomicUsize,
    pub set_password_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
}

impl Default for FakeServer {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            password: Mutex::new(String::from("hunter2")),
            username: Mutex::new(String::from("admin")),
            token: Mutex::new(Some(String::from("alist-token-1"))),
            start_delay: Mutex::new(Duration::ZERO),
            stop_delay: Mutex::new(Duration::ZERO),
            fail_init: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            fail_restore: AtomicBool::new(false),
            init_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            restore_calls: AtomicUsize::new(0),
            set_password_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeServer {
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn set_password(&self, password: &str) {
        *self.password.lock().unwrap() = password.to_string();
    }

    pub fn set_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(String::from);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerProcess for FakeServer {
    async fn init(&self) -> Result<(), ProcessError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(command_error("data directory is read-only"));
        }
        Ok(())
    }

    async fn start(&self) -> Result<(), ProcessError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.start_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(command_error("binary not found"));
        }
        self.set_running(true);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.stop_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(ProcessError::Stop {
                message: String::from("process ignored SIGTERM"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.set_running(false);
        Ok(())
    }

    async fn is_running(&self) -> Result<bool, ProcessError> {
        Ok(self.running.load(Ordering::SeqCst))
    }

    async fn admin_password(&self) -> Result<String, ProcessError> {
        Ok(self.password.lock().unwrap().clone())
    }

    async fn admin_username(&self) -> Result<String, ProcessError> {
        Ok(self.username.lock().unwrap().clone())
    }

    async fn set_admin_password(&self, password: &str) -> Result<(), ProcessError> {
        self.set_password_calls.fetch_add(1, Ordering::SeqCst);
        self.set_password(password);
        Ok(())
    }

    async fn admin_token(&self) -> Result<String, ProcessError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.token
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| command_error("token command failed"))
    }

    async fn restore(&self) -> Result<(), ProcessError> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_restore.load(Ordering::SeqCst) {
            return Err(ProcessError::Restore {
                message: String::from("backup is corrupted"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Platform services
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeNotifier {
    pub notifications: Mutex<Vec<(String, String)>>,
    pub notices: Mutex<Vec<String>>,
    pub fail_schedule: AtomicBool,
}

impl FakeNotifier {
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Notifier for FakeNotifier {
    fn schedule_notification(&self, title: &str, body: &str) -> Result<(), PlatformError> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(PlatformError::Notification {
                message: String::from("permission denied"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }

    fn show_notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct FakeOpener {
    pub opened: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl FakeOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl ExternalOpener for FakeOpener {
    fn open(&self, url: &str) -> Result<(), PlatformError> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::OpenUrl {
                url: url.to_string(),
                message: String::from("no handler installed"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

/// Records what happens to a browser instance, in order, into a shared log.
pub struct FakeBrowser {
    pub events: Arc<Mutex<Vec<String>>>,
    pub fail: AtomicBool,
    pub fail_reload: AtomicBool,
}

impl FakeBrowser {
    /// Simulates the webview's creation: pre-load script first, then the page.
    pub fn create(events: &Arc<Mutex<Vec<String>>>, preload: &str) -> Arc<Self> {
        let mut log = events.lock().unwrap();
        log.push(format!("preload:{preload}"));
        log.push(String::from("load"));
        drop(log);

        Arc::new(Self {
            events: Arc::clone(events),
            fail: AtomicBool::new(false),
            fail_reload: AtomicBool::new(false),
        })
    }
}

impl BrowserContext for FakeBrowser {
    fn execute_script(&self, script: &str) -> Result<(), SessionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SessionError::Injection {
                message: String::from("webview is gone"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.events.lock().unwrap().push(format!("exec:{script}"));
        Ok(())
    }

    fn reload(&self) -> Result<(), SessionError> {
        if self.fail_reload.load(Ordering::SeqCst) {
            return Err(SessionError::Injection {
                message: String::from("webview is gone"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.events.lock().unwrap().push(String::from("reload"));
        Ok(())
    }
}

pub struct FakeLanQuery {
    pub address: Mutex<Option<String>>,
    pub calls: AtomicUsize,
}

impl FakeLanQuery {
    pub fn new(address: Option<&str>) -> Self {
        Self {
            address: Mutex::new(address.map(String::from)),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LanAddressQuery for FakeLanQuery {
    async fn lan_address(&self) -> Result<String, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.address
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| NetworkError::NoAddress {
                message: String::from("interface has no IPv4 address"),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

pub struct Harness {
    pub supervisor: Supervisor,
    pub server: Arc<FakeServer>,
    pub notifier: Arc<FakeNotifier>,
    pub opener: Arc<FakeOpener>,
    pub lan: Arc<FakeLanQuery>,
}

/// Config with a short startup delay so lifecycle tests stay fast.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.startup.startup_delay_ms = 20;
    config
}

fn services(
    server: &Arc<FakeServer>,
    notifier: &Arc<FakeNotifier>,
    opener: &Arc<FakeOpener>,
    lan: &Arc<FakeLanQuery>,
) -> Services {
    Services {
        process: server.clone(),
        lan_query: lan.clone(),
        notifier: notifier.clone(),
        opener: opener.clone(),
    }
}

/// Supervisor on the fixed server endpoint; nothing is probed over HTTP.
pub fn harness(config: AppConfig) -> Harness {
    let server = Arc::new(FakeServer::default());
    let notifier = Arc::new(FakeNotifier::default());
    let opener = Arc::new(FakeOpener::default());
    let lan = Arc::new(FakeLanQuery::new(Some("192.168.1.20")));

    let supervisor = Supervisor::new(config, services(&server, &notifier, &opener, &lan))
        .expect("supervisor");

    Harness {
        supervisor,
        server,
        notifier,
        opener,
        lan,
    }
}

/// Supervisor whose liveness probe targets `mock`.
pub fn harness_with_mock(mock: &MockServer, config: AppConfig) -> Harness {
    let server = Arc::new(FakeServer::default());
    let notifier = Arc::new(FakeNotifier::default());
    let opener = Arc::new(FakeOpener::default());
    let lan = Arc::new(FakeLanQuery::new(Some("192.168.1.20")));

    let address = mock.address();
    let endpoint = ServerEndpointBuilder::default()
        .with_host(address.ip().to_string())
        .with_port(address.port())
        .build()
        .expect("endpoint");

    let supervisor = Supervisor::with_endpoint(
        config,
        endpoint,
        services(&server, &notifier, &opener, &lan),
    )
    .expect("supervisor");

    Harness {
        supervisor,
        server,
        notifier,
        opener,
        lan,
    }
}

pub async fn mock_ping(delay: Duration) -> MockServer {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("pong")
                .set_delay(delay),
        )
        .mount(&mock)
        .await;
    mock
}

/// Adopt an already running server so tests start from `Running`.
pub async fn adopt_running(harness: &Harness) {
    harness.server.set_running(true);
    let state = harness.supervisor.lifecycle().refresh().await;
    assert!(state.is_running(), "server should be adopted");
}
