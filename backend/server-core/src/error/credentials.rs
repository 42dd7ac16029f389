use crate::error::process::ProcessError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CredentialError {
    #[error("Credentials Unavailable: server is not running {location}")]
    NotRunning { location: ErrorLocation },

    #[error("Credential Query Error: {source} {location}")]
    Query {
        location: ErrorLocation,
        #[source]
        source: ProcessError,
    },

    #[error("Credential Bootstrap Error: {source} {location}")]
    Bootstrap {
        location: ErrorLocation,
        #[source]
        source: ProcessError,
    },
}
