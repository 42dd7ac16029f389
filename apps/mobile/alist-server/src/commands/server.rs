use crate::error::AppError;
use crate::state::AppState;

use models::{AccessInfo, ServerState};

use log::{debug, info};
use tauri::{State, command as TauriCommand};

/// Start the server and wait until it answers.
///
/// Failures are reported through the resulting state (`Stopped`), not as an error.
#[TauriCommand]
pub async fn start_server(state: State<'_, AppState>) -> Result<ServerState, AppError> {
    info!("Start requested");
    Ok(state.supervisor().lifecycle().start().await)
}

#[TauriCommand]
pub async fn stop_server(state: State<'_, AppState>) -> Result<ServerState, AppError> {
    info!("Stop requested");
    Ok(state.supervisor().lifecycle().stop().await)
}

/// The status screen's switch.
#[TauriCommand]
pub async fn toggle_server(state: State<'_, AppState>) -> Result<ServerState, AppError> {
    Ok(state.supervisor().toggle().await)
}

/// Current access details: state, credentials, addresses.
#[TauriCommand]
pub fn server_status(state: State<'_, AppState>) -> AccessInfo {
    debug!("Status requested");
    state.supervisor().access_info()
}
