use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failures reported by host platform services (URL opener, notifications).
#[derive(Debug, ThisError)]
pub enum PlatformError {
    #[error("Open URL Error: {url}: {message} {location}")]
    OpenUrl {
        url: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Notification Error: {message} {location}")]
    Notification {
        message: String,
        location: ErrorLocation,
    },
}
