//! Host platform services consumed by the core.
//!
//! The Tauri shell implements these with its notification and opener
//! plugins; tests use in-memory recorders.

use crate::error::platform::PlatformError;

/// User-facing notifications.
pub trait Notifier: Send + Sync {
    /// Schedule a local (system) notification.
    fn schedule_notification(&self, title: &str, body: &str) -> Result<(), PlatformError>;

    /// Show a short-lived in-app notice (toast). Never fails from the caller's view.
    fn show_notice(&self, message: &str);
}

/// Hands URLs to whatever app the platform has registered for them.
pub trait ExternalOpener: Send + Sync {
    /// Fails when no installed app handles the URL.
    fn open(&self, url: &str) -> Result<(), PlatformError>;
}
