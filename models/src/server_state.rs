use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Run-state of the embedded server.
///
/// Legal transitions: `Stopped -> Starting -> Running -> Stopped` and
/// `Starting -> Stopped` when the liveness probe fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerState {
    #[default]
    Stopped,
    Starting,
    Running,
}

impl ServerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ServerState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ServerState::Stopped)
    }
}

impl Display for ServerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let label = match self {
            ServerState::Stopped => "stopped",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
        };
        f.write_str(label)
    }
}
