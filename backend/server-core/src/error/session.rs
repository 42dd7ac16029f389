use crate::error::process::ProcessError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("Session Unavailable: server is not running {location}")]
    NotRunning { location: ErrorLocation },

    #[error("Token Fetch Error: {source} {location}")]
    TokenFetch {
        location: ErrorLocation,
        #[source]
        source: ProcessError,
    },

    #[error("Script Injection Error: {message} {location}")]
    Injection {
        message: String,
        location: ErrorLocation,
    },

    #[error("Mount Refused: {message} {location}")]
    MountRefused {
        message: String,
        location: ErrorLocation,
    },
}
