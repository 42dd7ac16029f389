// Unit tests for scheme classification in the navigation guard

use crate::error::platform::PlatformError;
use crate::platform::{ExternalOpener, Notifier};
use crate::session::navigation::NavigationGuard;

use std::sync::Arc;

struct NullPlatform;

impl ExternalOpener for NullPlatform {
    fn open(&self, _url: &str) -> Result<(), PlatformError> {
        Ok(())
    }
}

impl Notifier for NullPlatform {
    fn schedule_notification(&self, _title: &str, _body: &str) -> Result<(), PlatformError> {
        Ok(())
    }

    fn show_notice(&self, _message: &str) {}
}

fn guard(schemes: &[&str]) -> NavigationGuard {
    NavigationGuard::new(schemes, Arc::new(NullPlatform), Arc::new(NullPlatform))
}

/// **VALUE**: Verifies configured schemes are normalized.
///
/// **WHY THIS MATTERS**: Users write schemes as "VLC" or "tel:" in the config file; URL
/// schemes are compared lowercase and without the colon.
///
/// **BUG THIS CATCHES**: Would catch a guard that never matches because of case or a colon.
#[test]
fn given_mixed_case_schemes_with_colon_when_created_then_normalized() {
    // GIVEN / WHEN
    let guard = guard(&["VLC", "tel:", ""]);

    // THEN
    assert_eq!(guard.schemes(), &["vlc".to_string(), "tel".to_string()]);
}

#[test]
fn given_registered_scheme_when_is_external_called_then_true_regardless_of_case() {
    let guard = guard(&["mailto", "nplayer-http"]);

    assert!(guard.is_external("mailto:someone@example.com"));
    assert!(guard.is_external("MAILTO:someone@example.com"));
    assert!(guard.is_external("nplayer-http://127.0.0.1:5244/d/movie.mkv"));
}

/// **VALUE**: Verifies ordinary web URLs stay in the embedded browser.
///
/// **BUG THIS CATCHES**: Would catch prefix matching where "http" swallows "nplayer-http".
#[test]
fn given_web_url_when_is_external_called_then_false() {
    let guard = guard(&["nplayer-http", "vlc"]);

    assert!(!guard.is_external("http://127.0.0.1:5244/"));
    assert!(!guard.is_external("https://example.com/vlc"));
    assert!(!guard.is_external("not a url"));
}

/// **VALUE**: Verifies only pages the browser can show are remembered as current.
///
/// **BUG THIS CATCHES**: Would catch an empty URL or an external-app link replacing the page.
#[test]
fn given_empty_or_external_url_when_recorded_then_current_page_kept() {
    // GIVEN
    let guard = guard(&["vlc"]);
    guard.record_page("http://127.0.0.1:5244/movies");

    // WHEN
    guard.record_page("");
    guard.record_page("vlc://127.0.0.1:5244/d/a.mkv");

    // THEN
    assert_eq!(guard.current_page().as_deref(), Some("http://127.0.0.1:5244/movies"));
}

#[test]
fn given_cancelled_navigation_when_checked_then_not_current_page() {
    let guard = guard(&["mailto"]);

    guard.on_navigation("mailto:someone@example.com");

    assert_eq!(guard.current_page(), None);
}
