use crate::fakes::{FakeBrowser, FakeServer, adopt_running, fast_config, harness};

use server_core::error::session::SessionError;
use server_core::session::Injection;
use server_core::session::script::NOOP_SCRIPT;
use server_core::session::watchdog::{BrowserHealth, HEARTBEAT_COMMAND};

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn event_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// **VALUE**: Verifies a token fetched before the browser exists runs before the first page.
///
/// **WHY THIS MATTERS**: The web UI reads the token on load. If the page loads first, the
/// user sees the login screen even though the app holds a valid token.
///
/// **BUG THIS CATCHES**: Would catch executing the script after creation instead of passing
/// it as the pre-load script.
#[tokio::test]
async fn given_token_staged_when_browser_mounted_then_preload_runs_before_page_load() {
    // GIVEN: Running server, token refreshed with no browser yet
    let h = harness(fast_config());
    adopt_running(&h).await;
    let outcome = h.supervisor.session().refresh().await;
    assert_eq!(outcome, Injection::Staged);
    let events = event_log();

    // WHEN
    let browser = h
        .supervisor
        .session()
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");

    // THEN
    let log = events.lock().unwrap().clone();
    assert_eq!(log.len(), 2, "Unexpected events: {log:?}");
    assert!(log[0].starts_with("preload:localStorage.setItem"));
    assert!(log[0].contains("alist-token-1"));
    assert_eq!(log[1], "load");
    assert!(h.supervisor.session().has_browser());
    drop(browser);
}

/// **VALUE**: Verifies a live browser gets new tokens in place.
///
/// **WHY THIS MATTERS**: Reloading the browser on every focus would lose the user's place.
///
/// **BUG THIS CATCHES**: Would catch refreshes that only stage and never execute.
#[tokio::test]
async fn given_live_browser_when_token_refreshed_then_script_executed_in_place() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = h.supervisor.session();
    session.refresh().await;
    let events = event_log();
    session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");

    // WHEN
    h.server.set_token(Some("alist-token-2"));
    let outcome = session.refresh().await;

    // THEN
    assert_eq!(outcome, Injection::Executed);
    let log = events.lock().unwrap().clone();
    assert_eq!(log.len(), 3);
    assert!(log[2].starts_with("exec:"));
    assert!(log[2].contains("alist-token-2"));
    assert_eq!(
        session.token().map(|t| t.as_str().to_string()),
        Some("alist-token-2".to_string())
    );
}

#[tokio::test]
async fn given_failing_browser_when_token_refreshed_then_script_staged_for_remount() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = h.supervisor.session();
    session.refresh().await;
    let events = event_log();
    let browser = session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");
    browser.fail.store(true, Ordering::SeqCst);

    // WHEN
    h.server.set_token(Some("alist-token-3"));
    let outcome = session.refresh().await;

    // THEN
    assert_eq!(outcome, Injection::Staged);
    assert!(session.staged_script().is_some_and(|s| s.contains("alist-token-3")));
}

/// **VALUE**: Verifies a failed token fetch still lets the browser load.
///
/// **WHY THIS MATTERS**: The web UI works unauthenticated (login page); blocking the browser
/// on a token error would leave a blank screen.
///
/// **BUG THIS CATCHES**: Would catch leaving nothing staged, so `mount()` is refused forever.
#[tokio::test]
async fn given_token_fetch_failure_when_refreshed_then_noop_script_staged() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    h.server.set_token(None);

    // WHEN
    let outcome = h.supervisor.session().refresh().await;

    // THEN
    assert_eq!(outcome, Injection::Degraded);
    assert_eq!(h.supervisor.session().staged_script().as_deref(), Some(NOOP_SCRIPT));
    assert!(h.supervisor.session().token().is_none());
    assert!(h.supervisor.session().is_mountable());
}

/// **VALUE**: Verifies the browser cannot be created before a token (or no-op) is staged.
///
/// **BUG THIS CATCHES**: Would catch the race where the page loads before the token exists.
#[tokio::test]
async fn given_nothing_staged_when_mount_called_then_refused() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    let events = event_log();

    // WHEN
    let result = h
        .supervisor
        .session()
        .mount(|script| Ok(FakeBrowser::create(&events, script)));

    // THEN
    assert!(matches!(result, Err(SessionError::MountRefused { .. })));
    assert!(events.lock().unwrap().is_empty(), "Factory must not run");
}

#[tokio::test]
async fn given_stopped_server_when_refreshed_then_skipped_without_fetch() {
    let h = harness(fast_config());

    let outcome = h.supervisor.session().refresh().await;

    assert_eq!(outcome, Injection::Skipped);
    assert_eq!(FakeServer::calls(&h.server.token_calls), 0);
}

#[tokio::test]
async fn given_mounted_browser_when_detached_then_next_refresh_stages() {
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = h.supervisor.session();
    session.refresh().await;
    let events = event_log();
    session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");

    session.detach();

    assert!(!session.has_browser());
    assert_eq!(session.refresh().await, Injection::Staged);
}

// ============================================================================
// Reload and recovery of the live page
// ============================================================================

/// **VALUE**: Verifies a reload request reaches the live browser.
///
/// **BUG THIS CATCHES**: Would catch the reload control doing nothing once a browser exists.
#[tokio::test]
async fn given_mounted_browser_when_reload_requested_then_page_reloaded() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = h.supervisor.session();
    session.refresh().await;
    let events = event_log();
    session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");

    // WHEN
    let reloaded = session.reload().expect("reload");

    // THEN
    assert!(reloaded);
    assert_eq!(events.lock().unwrap().last().map(String::as_str), Some("reload"));
}

#[tokio::test]
async fn given_no_browser_when_reload_requested_then_nothing_to_reload() {
    let h = harness(fast_config());

    let reloaded = h.supervisor.session().reload().expect("reload");

    assert!(!reloaded);
}

/// **VALUE**: Verifies a page that answers its heartbeat is left alone.
///
/// **WHY THIS MATTERS**: A reload loses the user's place in the file list; it is only worth it
/// when the page is really gone.
///
/// **BUG THIS CATCHES**: Would catch the answer not being matched to the heartbeat it belongs to.
#[tokio::test]
async fn given_page_answers_heartbeat_when_checked_then_alive_without_reload() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = Arc::clone(h.supervisor.session());
    session.refresh().await;
    let events = event_log();
    session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");

    // WHEN: The page answers the first heartbeat while the check waits
    let check = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.check_browser(Duration::from_millis(500)).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let answered = session.acknowledge_heartbeat(1);
    let health = check.await.expect("check task");

    // THEN
    assert!(answered);
    assert_eq!(health, BrowserHealth::Alive);
    let log = events.lock().unwrap().clone();
    assert!(log.iter().any(|e| e.starts_with("exec:") && e.contains(HEARTBEAT_COMMAND)));
    assert!(!log.contains(&String::from("reload")), "Unexpected reload: {log:?}");
}

/// **VALUE**: Verifies a page that never answers is reloaded.
///
/// **WHY THIS MATTERS**: When the system kills the web content process the view stays blank
/// until something reloads it.
///
/// **BUG THIS CATCHES**: Would catch an unanswered heartbeat being treated as alive.
#[tokio::test]
async fn given_terminated_page_when_checked_then_reloaded() {
    // GIVEN: A browser whose page no longer runs scripts
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = h.supervisor.session();
    session.refresh().await;
    let events = event_log();
    session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");

    // WHEN
    let health = session.check_browser(Duration::from_millis(20)).await;

    // THEN
    assert_eq!(health, BrowserHealth::Recovered);
    assert_eq!(events.lock().unwrap().last().map(String::as_str), Some("reload"));
    assert!(session.has_browser());
}

/// **VALUE**: Verifies an answer to an older heartbeat does not count for the current one.
///
/// **BUG THIS CATCHES**: Would catch a late answer from a previous round hiding a dead page.
#[tokio::test]
async fn given_stale_heartbeat_answer_when_checked_then_still_reloaded() {
    // GIVEN: A first round that went unanswered
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = h.supervisor.session();
    session.refresh().await;
    let events = event_log();
    session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");
    assert_eq!(
        session.check_browser(Duration::from_millis(10)).await,
        BrowserHealth::Recovered
    );

    // WHEN: The first round's answer arrives late
    let answered = session.acknowledge_heartbeat(1);
    let health = session.check_browser(Duration::from_millis(10)).await;

    // THEN
    assert!(!answered);
    assert_eq!(health, BrowserHealth::Recovered);
}

/// **VALUE**: Verifies a browser that cannot even be reloaded is forgotten.
///
/// **WHY THIS MATTERS**: The next "open browser" must build a fresh view with the staged
/// session script instead of focusing a dead one.
///
/// **BUG THIS CATCHES**: Would catch the dead instance staying registered as live.
#[tokio::test]
async fn given_reload_fails_when_page_unresponsive_then_browser_detached() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    let session = h.supervisor.session();
    session.refresh().await;
    let events = event_log();
    let browser = session
        .mount(|script| Ok(FakeBrowser::create(&events, script)))
        .expect("mount");
    browser.fail_reload.store(true, Ordering::SeqCst);

    // WHEN
    let health = session.check_browser(Duration::from_millis(10)).await;

    // THEN
    assert_eq!(health, BrowserHealth::Lost);
    assert!(!session.has_browser());
    assert!(session.is_mountable());
}

#[tokio::test]
async fn given_no_browser_when_checked_then_absent() {
    let h = harness(fast_config());

    let health = h.supervisor.session().check_browser(Duration::from_millis(10)).await;

    assert_eq!(health, BrowserHealth::Absent);
}
