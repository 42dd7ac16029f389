use crate::error::AppError;
use crate::state::AppState;

use models::{ConnectivityEvent, WebConnectionReport};

use tauri::{State, command as TauriCommand};

/// Reported by the UI whenever the webview's connection changes.
#[TauriCommand]
pub async fn connectivity_changed(
    state: State<'_, AppState>,
    report: WebConnectionReport,
) -> Result<(), AppError> {
    state
        .connectivity_changed(ConnectivityEvent::from(&report))
        .await
}
