//! Tauri-backed implementations of the core's platform services.

use server_core::error::platform::PlatformError;
use server_core::platform::{ExternalOpener, Notifier};

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, warn};
use tauri::{AppHandle, Emitter};
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_opener::OpenerExt;

/// Event the status screen listens on to show a toast.
pub const NOTICE_EVENT: &str = "notice";

pub struct TauriNotifier {
    app: AppHandle,
}

impl TauriNotifier {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl Notifier for TauriNotifier {
    fn schedule_notification(&self, title: &str, body: &str) -> Result<(), PlatformError> {
        self.app
            .notification()
            .builder()
            .title(title)
            .body(body)
            .show()
            .map_err(|e| PlatformError::Notification {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn show_notice(&self, message: &str) {
        debug!("Notice: {message}");
        if let Err(e) = self.app.emit(NOTICE_EVENT, message) {
            warn!("Failed to emit notice: {e}");
        }
    }
}

/// Opens URLs with whatever app the OS has registered for their scheme.
pub struct TauriOpener {
    app: AppHandle,
}

impl TauriOpener {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ExternalOpener for TauriOpener {
    fn open(&self, url: &str) -> Result<(), PlatformError> {
        self.app
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| PlatformError::OpenUrl {
                url: url.to_string(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
