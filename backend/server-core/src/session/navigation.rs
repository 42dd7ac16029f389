//! Decides which navigations stay inside the embedded browser.

use crate::error::platform::PlatformError;
use crate::platform::{ExternalOpener, Notifier};

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};
use url::Url;

pub const OPEN_FAILED_NOTICE: &str =
    "Unable to open link. Please check that the app is installed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Cancel,
}

/// Routes external-app schemes, pop-ups and downloads to the platform opener,
/// and remembers the page the embedded browser last settled on.
pub struct NavigationGuard {
    schemes: Vec<String>,
    opener: Arc<dyn ExternalOpener>,
    notifier: Arc<dyn Notifier>,
    current: Mutex<Option<String>>,
}

impl NavigationGuard {
    pub fn new<I, S>(schemes: I, opener: Arc<dyn ExternalOpener>, notifier: Arc<dyn Notifier>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let schemes = schemes
            .into_iter()
            .map(|s| s.as_ref().trim_end_matches(':').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            schemes,
            opener,
            notifier,
            current: Mutex::new(None),
        }
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    /// Whether `url` belongs to one of the registered external-app schemes.
    pub fn is_external(&self, url: &str) -> bool {
        scheme_of(url).is_some_and(|scheme| self.schemes.iter().any(|s| *s == scheme))
    }

    /// Called before the browser loads `url`. Allowed URLs become the current page.
    pub fn on_navigation(&self, url: &str) -> NavigationDecision {
        if self.is_external(url) {
            debug!("Handing {url} to an external app");
            self.open_external(url);
            NavigationDecision::Cancel
        } else {
            self.record_page(url);
            NavigationDecision::Allow
        }
    }

    /// Records where the browser is now. In-page route changes never reach
    /// `on_navigation`, so the shell reports them here as well.
    pub fn record_page(&self, url: &str) {
        if url.is_empty() || self.is_external(url) {
            return;
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
    }

    pub fn current_page(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The browser was closed; the next one starts from its initial page.
    pub fn forget_page(&self) {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Opens the current page, or `home` before any page loaded, in the
    /// system browser. Returns the URL handed to the opener.
    pub fn open_current_externally(&self, home: &str) -> Result<String, PlatformError> {
        let url = self.current_page().unwrap_or_else(|| home.to_string());
        debug!("Opening {url} in the system browser");
        match self.opener.open(&url) {
            Ok(()) => Ok(url),
            Err(e) => {
                warn!("No app could open {url}: {e}");
                self.notifier.show_notice(OPEN_FAILED_NOTICE);
                Err(e)
            }
        }
    }

    /// Pop-ups never open inside the embedded browser.
    pub fn on_new_window(&self, url: &str) {
        debug!("Redirecting new window {url} to the external opener");
        self.open_external(url);
    }

    /// Downloads are left to the platform.
    pub fn on_download(&self, url: &str) {
        debug!("Redirecting download {url} to the external opener");
        self.open_external(url);
    }

    fn open_external(&self, url: &str) {
        if let Err(e) = self.opener.open(url) {
            warn!("No app could open {url}: {e}");
            self.notifier.show_notice(OPEN_FAILED_NOTICE);
        }
    }
}

fn scheme_of(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed.scheme().to_string()),
        Err(_) => url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase()),
    }
}
