use crate::error::AppError;
use crate::state::AppState;

use server_core::config::UserSettings;

use tauri::{State, command as TauriCommand};

#[TauriCommand]
pub fn get_settings(state: State<'_, AppState>) -> UserSettings {
    state.settings()
}

#[TauriCommand]
pub fn update_settings(
    state: State<'_, AppState>,
    settings: UserSettings,
) -> Result<UserSettings, AppError> {
    state.update_settings(settings)
}
