use crate::error::AppError;
use crate::state::AppState;
use crate::webview;

use log::debug;
use tauri::{AppHandle, State, command as TauriCommand};

/// Whether the browser can be opened yet (server running, session script staged).
#[TauriCommand]
pub fn browser_ready(state: State<'_, AppState>) -> bool {
    state.supervisor().session().is_mountable()
}

/// Open the embedded AList web UI, signed in with the current session token.
#[TauriCommand]
pub async fn open_browser(app: AppHandle, state: State<'_, AppState>) -> Result<(), AppError> {
    debug!("Browser requested");
    webview::open_browser(&app, state.supervisor())
}

#[TauriCommand]
pub async fn close_browser(app: AppHandle) -> Result<(), AppError> {
    webview::close_browser(&app)
}

/// Reload the embedded browser; false when it is not open.
#[TauriCommand]
pub async fn reload_browser(state: State<'_, AppState>) -> Result<bool, AppError> {
    webview::reload_browser(state.supervisor())
}

/// Hand the page the embedded browser shows to the system browser.
#[TauriCommand]
pub async fn open_current_externally(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<String, AppError> {
    webview::open_current_externally(&app, state.supervisor())
}

/// Called from the AList page in answer to a heartbeat script.
#[TauriCommand]
pub fn browser_heartbeat(state: State<'_, AppState>, seq: u64, url: String) {
    let supervisor = state.supervisor();
    supervisor.navigation().record_page(&url);
    if supervisor.session().acknowledge_heartbeat(seq) {
        debug!("Browser answered heartbeat {seq} from {url}");
    }
}
