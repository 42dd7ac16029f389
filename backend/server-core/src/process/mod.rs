//! The embedded server process as seen by the core.
//!
//! [`ServerProcess`] is the black-box contract: the core never looks inside
//! the server, it only calls these primitives. [`sidecar::SidecarServer`] is
//! the implementation for hosts that run AList as a child process.

pub mod listener;
pub mod sidecar;

use crate::error::process::ProcessError;

use async_trait::async_trait;

#[async_trait]
pub trait ServerProcess: Send + Sync {
    /// Prepare the server's data directory. Idempotent.
    async fn init(&self) -> Result<(), ProcessError>;

    async fn start(&self) -> Result<(), ProcessError>;

    async fn stop(&self) -> Result<(), ProcessError>;

    async fn is_running(&self) -> Result<bool, ProcessError>;

    /// Current admin password; an empty string means none has been set yet.
    async fn admin_password(&self) -> Result<String, ProcessError>;

    async fn admin_username(&self) -> Result<String, ProcessError>;

    /// Persist a new admin password inside the server's own store.
    async fn set_admin_password(&self, password: &str) -> Result<(), ProcessError>;

    /// A fresh admin session token for the web UI.
    async fn admin_token(&self) -> Result<String, ProcessError>;

    /// Restore server data from the external backup store. Best-effort.
    async fn restore(&self) -> Result<(), ProcessError>;
}

impl ProcessError {
    /// The human-readable part of the error, without the source location.
    pub fn user_message(&self) -> &str {
        match self {
            ProcessError::Spawn { message, .. }
            | ProcessError::Command { message, .. }
            | ProcessError::Parse { message, .. }
            | ProcessError::Timeout { message, .. }
            | ProcessError::Stop { message, .. }
            | ProcessError::Restore { message, .. }
            | ProcessError::SystemQuery { message, .. }
            | ProcessError::Io { message, .. } => message,
        }
    }
}
