// Library exports for testing and for the mobile entry point.
// The desktop binary (main.rs) calls `run()`.

pub mod commands;
pub mod error;
pub mod logger;
pub mod platform;
pub mod state;
pub mod webview;

#[cfg(test)]
mod tests;

use error::AppError;
use logger::initialize as LoggerInitialize;
use platform::{TauriNotifier, TauriOpener};
use state::AppState;

use server_core::config::{AppConfig, default_data_dir};
use server_core::network::LocalIpQuery;
use server_core::process::sidecar::SidecarServer;
use server_core::supervisor::{Services, Supervisor};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tauri::{App, AppHandle, Emitter, Manager, Window, WindowEvent};

/// Label of the status screen window.
pub const MAIN_WINDOW_LABEL: &str = "main";

/// Event carrying a fresh `AccessInfo` to the status screen.
pub const ACCESS_INFO_EVENT: &str = "access-info";

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_notification::init())
        .invoke_handler(tauri::generate_handler![
            commands::server::start_server,
            commands::server::stop_server,
            commands::server::toggle_server,
            commands::server::server_status,
            commands::session::browser_ready,
            commands::session::open_browser,
            commands::session::close_browser,
            commands::session::reload_browser,
            commands::session::open_current_externally,
            commands::session::browser_heartbeat,
            commands::network::connectivity_changed,
            commands::settings::get_settings,
            commands::settings::update_settings,
        ])
        .setup(|app| {
            setup(app)?;
            Ok(())
        })
        .on_window_event(on_window_event)
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// One of Tauri's app directories, or the per-user data directory when the
/// host cannot provide it.
pub(crate) fn resolve_app_dir(dir: tauri::Result<PathBuf>, what: &str) -> PathBuf {
    dir.unwrap_or_else(|e| {
        let fallback = default_data_dir();
        warn!("No {what} directory from the host ({e}), using {}", fallback.display());
        fallback
    })
}

#[track_caller]
fn app_dir(dir: tauri::Result<PathBuf>, what: &str) -> Result<PathBuf, AppError> {
    let dir = resolve_app_dir(dir, what);

    create_dir_all(&dir).map_err(|e| AppError::App {
        message: format!("Failed to create {what} directory {}: {e}", dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    Ok(dir)
}

fn setup(app: &mut App) -> Result<(), AppError> {
    let log_dir = app_dir(app.path().app_log_dir(), "log")?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("AList server shell starting");
    info!("Log directory: {}", log_dir.display());

    let config_dir = app_dir(app.path().app_config_dir(), "config")?;
    let data_dir = app_dir(app.path().app_data_dir(), "data")?;
    let config = AppConfig::load_or_default(&config_dir);

    let sidecar = config.server.sidecar(&data_dir);
    info!("Server data directory: {}", sidecar.data_dir.display());

    let handle = app.handle().clone();
    let services = Services {
        process: Arc::new(SidecarServer::new(sidecar)),
        lan_query: Arc::new(LocalIpQuery),
        notifier: Arc::new(TauriNotifier::new(handle.clone())),
        opener: Arc::new(TauriOpener::new(handle.clone())),
    };

    let supervisor = Arc::new(Supervisor::new(config, services).map_err(|e| AppError::Core {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?);

    // Background tasks need the async runtime's context.
    let state = tauri::async_runtime::block_on({
        let supervisor = Arc::clone(&supervisor);
        let handle = handle.clone();
        async move {
            AppState::new(supervisor, config_dir, move |info| {
                if let Err(e) = handle.emit(ACCESS_INFO_EVENT, &info) {
                    error!("Failed to publish access info: {e}");
                }
            })
        }
    });
    app.manage(state);

    tauri::async_runtime::spawn(async move {
        let outcome = supervisor.activate().await;
        info!("Activation finished: {outcome:?}");
    });

    Ok(())
}

fn on_window_event(window: &Window, event: &WindowEvent) {
    if window.label() != MAIN_WINDOW_LABEL {
        return;
    }

    if let WindowEvent::Focused(true) = event {
        on_focus(window.app_handle().clone());
    }
}

fn on_focus(app: AppHandle) {
    let Some(state) = app.try_state::<AppState>() else {
        debug!("Focus before setup finished, ignoring");
        return;
    };

    let supervisor = Arc::clone(state.supervisor());
    tauri::async_runtime::spawn(async move {
        let state = supervisor.on_focus().await;
        debug!("Focus refresh done, server is {state}");
    });
}
