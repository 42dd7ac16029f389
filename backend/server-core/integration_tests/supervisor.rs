use crate::fakes::{adopt_running, fast_config, harness};

use models::ServerState;

use std::time::Duration;

/// **VALUE**: Verifies credentials and token follow the server state automatically.
///
/// **WHY THIS MATTERS**: The status screen and browser must never show a password or token
/// for a server that is no longer running.
///
/// **BUG THIS CATCHES**: Would catch a follower that resolves on start but never clears on
/// stop.
#[tokio::test]
async fn given_state_follower_when_server_runs_then_stops_then_data_resolved_then_cleared() {
    // GIVEN
    let h = harness(fast_config());
    let follower = h.supervisor.follow_server_state();
    let mut credentials_rx = h.supervisor.credentials().subscribe();
    let mut token_rx = h.supervisor.session().subscribe_token();

    // WHEN: The server comes up
    adopt_running(&h).await;

    // THEN: Credentials and token are resolved
    tokio::time::timeout(Duration::from_secs(2), credentials_rx.wait_for(|c| c.is_some()))
        .await
        .expect("credentials within timeout")
        .expect("channel open");
    tokio::time::timeout(Duration::from_secs(2), token_rx.wait_for(|t| t.is_some()))
        .await
        .expect("token within timeout")
        .expect("channel open");

    // WHEN: The server is switched off
    assert_eq!(h.supervisor.toggle().await, ServerState::Stopped);

    // THEN: Both are dropped
    tokio::time::timeout(Duration::from_secs(2), credentials_rx.wait_for(|c| c.is_none()))
        .await
        .expect("credentials cleared within timeout")
        .expect("channel open");
    tokio::time::timeout(Duration::from_secs(2), token_rx.wait_for(|t| t.is_none()))
        .await
        .expect("token cleared within timeout")
        .expect("channel open");
    assert!(h.supervisor.session().staged_script().is_none());

    follower.abort();
}

/// **VALUE**: Verifies focus picks up a server started outside the app.
///
/// **BUG THIS CATCHES**: Would catch `on_focus()` only refreshing data when the state was
/// already `Running`.
#[tokio::test]
async fn given_server_started_elsewhere_when_focused_then_adopted_and_resolved() {
    // GIVEN
    let h = harness(fast_config());
    h.server.set_running(true);

    // WHEN
    let state = h.supervisor.on_focus().await;

    // THEN
    assert_eq!(state, ServerState::Running);
    assert!(h.supervisor.credentials().current().is_some());
    assert!(h.supervisor.session().staged_script().is_some());
}

#[tokio::test]
async fn given_stopped_server_when_focused_then_nothing_resolved() {
    let h = harness(fast_config());

    let state = h.supervisor.on_focus().await;

    assert_eq!(state, ServerState::Stopped);
    assert!(h.supervisor.credentials().current().is_none());
}

/// **VALUE**: Verifies the access snapshot combines state, credentials and LAN address.
///
/// **BUG THIS CATCHES**: Would catch exposing credentials while stopped.
#[tokio::test]
async fn given_running_server_when_access_info_taken_then_fields_populated() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    h.supervisor.credentials().resolve().await.expect("credentials");

    // WHEN
    let info = h.supervisor.access_info();

    // THEN
    assert_eq!(info.state, ServerState::Running);
    assert_eq!(info.username.as_deref(), Some("admin"));
    assert_eq!(info.password.as_deref(), Some("hunter2"));
    assert_eq!(info.loopback_address, "127.0.0.1");
    assert_eq!(info.port, 5244);
    assert_eq!(info.webdav_path, "dav");
}

#[test]
fn given_paths_when_browser_url_built_then_relative_to_server() {
    let h = harness(fast_config());

    assert_eq!(h.supervisor.browser_url("/"), "http://127.0.0.1:5244/");
    assert_eq!(h.supervisor.browser_url("@manage"), "http://127.0.0.1:5244/@manage");
}
