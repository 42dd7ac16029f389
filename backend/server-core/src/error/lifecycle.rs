use crate::error::liveness::LivenessError;
use crate::error::process::ProcessError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LifecycleError {
    #[error("Start Error: {source} {location}")]
    Start {
        location: ErrorLocation,
        #[source]
        source: ProcessError,
    },

    #[error("Not Ready Error: {source} {location}")]
    NotReady {
        location: ErrorLocation,
        #[source]
        source: LivenessError,
    },

    #[error("Stop Error: {source} {location}")]
    Stop {
        location: ErrorLocation,
        #[source]
        source: ProcessError,
    },

    #[error("Init Error: {source} {location}")]
    Init {
        location: ErrorLocation,
        #[source]
        source: ProcessError,
    },
}
