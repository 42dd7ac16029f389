use common::{ErrorLocation, HttpStatusCode};

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LivenessError {
    #[error("Probe Request Error: {url}: {message} {location}")]
    Request {
        url: String,
        message: String,
        is_timeout: bool,
        location: ErrorLocation,
    },

    #[error("Probe Status Error: {url}: HTTP {status} {location}")]
    Status {
        url: String,
        status: HttpStatusCode,
        location: ErrorLocation,
    },

    #[error("Probe Client Error: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
    },
}

impl LivenessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LivenessError::Request { is_timeout: true, .. })
    }
}
