use common::ErrorLocation;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

/// Failures of the embedded server's primitives.
#[derive(Debug, ThisError)]
pub enum ProcessError {
    #[error("Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Command Error: {message} {location}")]
    Command {
        message: String,
        location: ErrorLocation,
    },

    #[error("Parse Error: {message} {location}")]
    Parse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Stop Error: {message} {location}")]
    Stop {
        message: String,
        location: ErrorLocation,
    },

    #[error("Restore Error: {message} {location}")]
    Restore {
        message: String,
        location: ErrorLocation,
    },

    #[error("System Query Error: {message} {location}")]
    SystemQuery {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },
}
