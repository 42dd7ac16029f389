//! The embedded browser showing the AList web UI.

use crate::error::AppError;

use server_core::USER_AGENT_APPLICATION_NAME;
use server_core::error::session::SessionError;
use server_core::session::BrowserContext;
use server_core::session::navigation::NavigationDecision;
use server_core::supervisor::Supervisor;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{debug, info, warn};
use tauri::webview::{DownloadEvent, NewWindowResponse, PageLoadEvent};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use url::Url;

pub const BROWSER_LABEL: &str = "alist";
const BROWSER_TITLE: &str = "AList";
const RELOAD_SCRIPT: &str = "window.location.reload();";

/// User agent of the embedded browser; the web UI uses the application
/// name to detect that it runs inside the app.
pub fn user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible) {USER_AGENT_APPLICATION_NAME}/{}",
        env!("CARGO_PKG_VERSION")
    )
}

pub struct TauriBrowser {
    window: WebviewWindow,
}

impl BrowserContext for TauriBrowser {
    fn execute_script(&self, script: &str) -> Result<(), SessionError> {
        self.window
            .eval(script)
            .map_err(|e| SessionError::Injection {
                message: format!("Failed to evaluate script in '{}': {e}", self.window.label()),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn reload(&self) -> Result<(), SessionError> {
        self.execute_script(RELOAD_SCRIPT)
    }
}

/// Show the browser, creating it with the staged session script if needed.
pub fn open_browser(app: &AppHandle, supervisor: &Arc<Supervisor>) -> Result<(), AppError> {
    if let Some(window) = app.get_webview_window(BROWSER_LABEL) {
        debug!("Browser already open, focusing it");
        if let Err(e) = window.set_focus() {
            warn!("Failed to focus browser: {e}");
        }
        return Ok(());
    }

    let address = supervisor.browser_url(&supervisor.config().browser.initial_path);
    let url = Url::parse(&address).map_err(|e| AppError::Browser {
        message: format!("Invalid browser URL '{address}': {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let session = Arc::clone(supervisor.session());
    let navigation = Arc::clone(supervisor.navigation());
    let popups = Arc::clone(supervisor.navigation());
    let downloads = Arc::clone(supervisor.navigation());
    let pages = Arc::clone(supervisor.navigation());
    let watched = Arc::clone(supervisor);

    supervisor
        .session()
        .mount(|script| {
            let window = WebviewWindowBuilder::new(app, BROWSER_LABEL, WebviewUrl::External(url))
                .title(BROWSER_TITLE)
                .user_agent(&user_agent())
                .initialization_script(script)
                .on_navigation(move |url| {
                    navigation.on_navigation(url.as_str()) == NavigationDecision::Allow
                })
                .on_new_window(move |url, _features| {
                    popups.on_new_window(url.as_str());
                    NewWindowResponse::Deny
                })
                .on_download(move |_webview, event| {
                    if let DownloadEvent::Requested { url, .. } = event {
                        downloads.on_download(url.as_str());
                    }
                    false
                })
                .on_page_load(move |_webview, payload| {
                    if let PageLoadEvent::Finished = payload.event() {
                        pages.record_page(payload.url().as_str());
                    }
                })
                .build()
                .map_err(|e| SessionError::Injection {
                    message: format!("Failed to create browser: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            window.on_window_event(move |event| match event {
                WindowEvent::Focused(true) => check_browser(&watched),
                WindowEvent::Destroyed => {
                    session.detach();
                    watched.navigation().forget_page();
                }
                _ => {}
            });

            Ok(Arc::new(TauriBrowser { window }))
        })
        .map_err(|e| AppError::Browser {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Browser opened at {address}");
    Ok(())
}

/// A page whose content process was killed in the background stays blank;
/// back in front, it has to answer a heartbeat or gets reloaded.
fn check_browser(supervisor: &Arc<Supervisor>) {
    let supervisor = Arc::clone(supervisor);
    tauri::async_runtime::spawn(async move {
        let timeout = supervisor.config().browser.heartbeat_timeout();
        let health = supervisor.session().check_browser(timeout).await;
        debug!("Browser check finished: {health:?}");
    });
}

#[track_caller]
pub fn reload_browser(supervisor: &Supervisor) -> Result<bool, AppError> {
    supervisor.session().reload().map_err(|e| AppError::Browser {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Open the page the browser shows in the system browser.
#[track_caller]
pub fn open_current_externally(app: &AppHandle, supervisor: &Supervisor) -> Result<String, AppError> {
    let navigation = supervisor.navigation();
    if let Some(window) = app.get_webview_window(BROWSER_LABEL) {
        match window.url() {
            Ok(url) => navigation.record_page(url.as_str()),
            Err(e) => warn!("Failed to read the browser location: {e}"),
        }
    }

    let home = supervisor.browser_url(&supervisor.config().browser.initial_path);
    navigation
        .open_current_externally(&home)
        .map_err(|e| AppError::Browser {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

pub fn close_browser(app: &AppHandle) -> Result<(), AppError> {
    match app.get_webview_window(BROWSER_LABEL) {
        Some(window) => window.close().map_err(|e| AppError::Browser {
            message: format!("Failed to close browser: {e}"),
            location: ErrorLocation::from(Location::caller()),
        }),
        None => Ok(()),
    }
}
