use crate::fakes::{fast_config, harness};

use server_core::session::navigation::{NavigationDecision, OPEN_FAILED_NOTICE};

use std::sync::atomic::Ordering;

/// **VALUE**: Verifies external-app links leave the embedded browser.
///
/// **WHY THIS MATTERS**: A `mailto:` or player link loaded inside the webview shows an error
/// page instead of opening the app.
///
/// **BUG THIS CATCHES**: Would catch allowing the navigation or never calling the opener.
#[test]
fn given_mailto_link_when_navigating_then_cancelled_and_opened_externally() {
    // GIVEN
    let h = harness(fast_config());

    // WHEN
    let decision = h
        .supervisor
        .navigation()
        .on_navigation("mailto:support@example.com");

    // THEN
    assert_eq!(decision, NavigationDecision::Cancel);
    assert_eq!(h.opener.opened(), vec!["mailto:support@example.com".to_string()]);
    assert!(h.notifier.notices().is_empty());
}

#[test]
fn given_web_link_when_navigating_then_allowed() {
    let h = harness(fast_config());

    let decision = h
        .supervisor
        .navigation()
        .on_navigation("http://127.0.0.1:5244/@manage");

    assert_eq!(decision, NavigationDecision::Allow);
    assert!(h.opener.opened().is_empty());
}

/// **VALUE**: Verifies the user is told when no app can handle a link.
///
/// **BUG THIS CATCHES**: Would catch opener failures that are silently dropped.
#[test]
fn given_missing_app_when_navigating_to_player_link_then_notice_shown() {
    // GIVEN
    let h = harness(fast_config());
    h.opener.fail.store(true, Ordering::SeqCst);

    // WHEN
    let decision = h
        .supervisor
        .navigation()
        .on_navigation("vlc://127.0.0.1:5244/d/movie.mkv");

    // THEN
    assert_eq!(decision, NavigationDecision::Cancel);
    assert_eq!(h.notifier.notices(), vec![OPEN_FAILED_NOTICE.to_string()]);
}

#[test]
fn given_new_window_request_when_handled_then_opened_externally() {
    let h = harness(fast_config());

    h.supervisor
        .navigation()
        .on_new_window("https://github.com/alist-org/alist");

    assert_eq!(
        h.opener.opened(),
        vec!["https://github.com/alist-org/alist".to_string()]
    );
}

#[test]
fn given_download_when_handled_then_opened_externally() {
    let h = harness(fast_config());

    h.supervisor
        .navigation()
        .on_download("http://127.0.0.1:5244/d/file.zip");

    assert_eq!(h.opener.opened(), vec!["http://127.0.0.1:5244/d/file.zip".to_string()]);
}

// ============================================================================
// Current page and "open in system browser"
// ============================================================================

/// **VALUE**: Verifies the page the browser moved to is what gets opened externally.
///
/// **WHY THIS MATTERS**: The "open in browser" control is for continuing in a full browser on
/// the page the user is looking at, not on the home page.
///
/// **BUG THIS CATCHES**: Would catch allowed navigations not being tracked.
#[test]
fn given_navigated_page_when_opened_externally_then_current_page_opened() {
    // GIVEN
    let h = harness(fast_config());
    let navigation = h.supervisor.navigation();
    let home = h.supervisor.browser_url("/");
    navigation.on_navigation("http://127.0.0.1:5244/@manage");

    // WHEN
    let opened = navigation.open_current_externally(&home).expect("opened");

    // THEN
    assert_eq!(opened, "http://127.0.0.1:5244/@manage");
    assert_eq!(h.opener.opened(), vec![opened]);
}

/// **VALUE**: Verifies in-page route changes and external links update the page correctly.
///
/// **BUG THIS CATCHES**: Would catch a `vlc:` link handed to an app becoming the "current
/// page", which would then be opened again by the external-browser control.
#[test]
fn given_route_change_then_external_link_when_tracked_then_route_is_current() {
    // GIVEN
    let h = harness(fast_config());
    let navigation = h.supervisor.navigation();

    // WHEN
    navigation.on_navigation("http://127.0.0.1:5244/");
    navigation.record_page("http://127.0.0.1:5244/movies");
    navigation.on_navigation("vlc://127.0.0.1:5244/d/movies/a.mkv");

    // THEN
    assert_eq!(
        navigation.current_page().as_deref(),
        Some("http://127.0.0.1:5244/movies")
    );
}

#[test]
fn given_no_page_loaded_when_opened_externally_then_home_opened() {
    let h = harness(fast_config());
    let home = h.supervisor.browser_url("/");

    let opened = h
        .supervisor
        .navigation()
        .open_current_externally(&home)
        .expect("opened");

    assert_eq!(opened, home);
}

/// **VALUE**: Verifies a closed browser does not leave its last page behind.
///
/// **BUG THIS CATCHES**: Would catch the control opening a page from a previous session.
#[test]
fn given_forgotten_page_when_opened_externally_then_home_opened() {
    // GIVEN
    let h = harness(fast_config());
    let navigation = h.supervisor.navigation();
    let home = h.supervisor.browser_url("/");
    navigation.on_navigation("http://127.0.0.1:5244/@manage");

    // WHEN
    navigation.forget_page();
    let opened = navigation.open_current_externally(&home).expect("opened");

    // THEN
    assert_eq!(opened, home);
}

#[test]
fn given_no_system_browser_when_opening_current_page_then_error_and_notice() {
    // GIVEN
    let h = harness(fast_config());
    h.opener.fail.store(true, Ordering::SeqCst);
    let home = h.supervisor.browser_url("/");

    // WHEN
    let result = h.supervisor.navigation().open_current_externally(&home);

    // THEN
    assert!(result.is_err());
    assert_eq!(h.notifier.notices(), vec![OPEN_FAILED_NOTICE.to_string()]);
}
