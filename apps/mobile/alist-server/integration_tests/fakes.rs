//! Minimal in-memory services for driving `AppState` without a Tauri runtime.

use server_core::config::AppConfig;
use server_core::error::network::NetworkError;
use server_core::error::platform::PlatformError;
use server_core::error::process::ProcessError;
use server_core::network::LanAddressQuery;
use server_core::platform::{ExternalOpener, Notifier};
use server_core::process::ServerProcess;
use server_core::supervisor::{Services, Supervisor};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

#[derive(Default)]
pub struct FakeServer {
    pub running: AtomicBool,
}

#[async_trait]
impl ServerProcess for FakeServer {
    async fn init(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn start(&self) -> Result<(), ProcessError> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_running(&self) -> Result<bool, ProcessError> {
        Ok(self.running.load(Ordering::SeqCst))
    }

    async fn admin_password(&self) -> Result<String, ProcessError> {
        Ok(String::from("s3cret"))
    }

    async fn admin_username(&self) -> Result<String, ProcessError> {
        Ok(String::from("admin"))
    }

    async fn set_admin_password(&self, _password: &str) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn admin_token(&self) -> Result<String, ProcessError> {
        Ok(String::from("alist-token"))
    }

    async fn restore(&self) -> Result<(), ProcessError> {
        Ok(())
    }
}

pub struct QuietPlatform;

impl Notifier for QuietPlatform {
    fn schedule_notification(&self, _title: &str, _body: &str) -> Result<(), PlatformError> {
        Ok(())
    }

    fn show_notice(&self, _message: &str) {}
}

impl ExternalOpener for QuietPlatform {
    fn open(&self, _url: &str) -> Result<(), PlatformError> {
        Ok(())
    }
}

pub struct FixedLan;

#[async_trait]
impl LanAddressQuery for FixedLan {
    async fn lan_address(&self) -> Result<String, NetworkError> {
        Ok(String::from("10.0.0.7"))
    }
}

pub fn supervisor(server: &Arc<FakeServer>) -> Arc<Supervisor> {
    let platform = Arc::new(QuietPlatform);
    let services = Services {
        process: server.clone(),
        lan_query: Arc::new(FixedLan),
        notifier: platform.clone(),
        opener: platform,
    };

    Arc::new(Supervisor::new(AppConfig::default(), services).expect("supervisor"))
}
