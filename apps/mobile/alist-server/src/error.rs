use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors returned by Tauri commands.
///
/// Serialized as `{ "type": <variant>, "data": { message, location } }` for the UI.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum AppError {
    /// Error from the shell itself (setup, paths, channels)
    #[error("App Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from server-core operations
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// The embedded browser could not be created or used
    #[error("Browser Error: {message} {location}")]
    Browser {
        message: String,
        location: ErrorLocation,
    },

    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },
}
