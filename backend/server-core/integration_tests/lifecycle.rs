use crate::fakes::{
    FakeServer, adopt_running, fast_config, harness, harness_with_mock, mock_ping,
};

use server_core::error::lifecycle::LifecycleError;
use server_core::lifecycle::{INIT_FAILED_NOTICE, InitOutcome, RUNNING_NOTIFICATION_TITLE};

use models::ServerState;

use std::sync::atomic::Ordering;
use std::time::Duration;

// ============================================================================
// start() / stop() against a wiremock `/ping`
// ============================================================================

/// **VALUE**: Verifies the happy path: start, probe `/ping`, publish `Running`.
///
/// **WHY THIS MATTERS**: Every other feature (credentials, session, browser) waits on
/// `Running`. If it is never published the app looks dead.
///
/// **BUG THIS CATCHES**: Would catch skipping the liveness probe or leaving the state at
/// `Starting` after a successful probe.
#[tokio::test]
async fn given_healthy_server_when_start_called_then_state_is_running() {
    // GIVEN: A server whose /ping answers immediately
    let mock = mock_ping(Duration::ZERO).await;
    let h = harness_with_mock(&mock, fast_config());

    // WHEN
    let state = h.supervisor.lifecycle().start().await;

    // THEN
    assert_eq!(state, ServerState::Running);
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Running);
    assert_eq!(FakeServer::calls(&h.server.start_calls), 1);
}

/// **VALUE**: Verifies a `/ping` slower than the probe timeout fails the start.
///
/// **WHY THIS MATTERS**: A hung server must not leave the UI stuck in "starting" forever.
///
/// **BUG THIS CATCHES**: Would catch a probe without a timeout, or a timeout that is
/// silently treated as success.
#[tokio::test]
async fn given_ping_slower_than_timeout_when_start_called_then_state_is_stopped() {
    // GIVEN: /ping answers after 1.5s, the probe waits at most 1s
    let mock = mock_ping(Duration::from_millis(1500)).await;
    let h = harness_with_mock(&mock, fast_config());

    // WHEN
    let result = h.supervisor.lifecycle().try_start().await;

    // THEN
    match result {
        Err(LifecycleError::NotReady { source, .. }) => {
            assert!(source.is_timeout(), "Expected a timeout, got: {source}")
        }
        other => panic!("Expected NotReady, got {other:?}"),
    }
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Stopped);
}

#[tokio::test]
async fn given_failing_spawn_when_start_called_then_state_is_stopped() {
    // GIVEN
    let mock = mock_ping(Duration::ZERO).await;
    let h = harness_with_mock(&mock, fast_config());
    h.server.fail_start.store(true, Ordering::SeqCst);

    // WHEN
    let result = h.supervisor.lifecycle().try_start().await;

    // THEN
    assert!(matches!(result, Err(LifecycleError::Start { .. })));
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Stopped);
}

/// **VALUE**: Verifies overlapping starts spawn the server only once.
///
/// **WHY THIS MATTERS**: A double tap on the switch plus auto-run can call `start()` twice;
/// two spawns would fight over the port.
///
/// **BUG THIS CATCHES**: Would catch a check-then-set race in the start guard.
#[tokio::test]
async fn given_concurrent_starts_when_both_run_then_process_started_once() {
    // GIVEN: A slow spawn so the calls overlap
    let mock = mock_ping(Duration::ZERO).await;
    let h = harness_with_mock(&mock, fast_config());
    *h.server.start_delay.lock().unwrap() = Duration::from_millis(100);

    // WHEN
    let lifecycle = h.supervisor.lifecycle();
    let (first, second) = tokio::join!(lifecycle.start(), lifecycle.start());

    // THEN
    assert_eq!(FakeServer::calls(&h.server.start_calls), 1);
    assert_eq!(first, ServerState::Running);
    assert_eq!(second, ServerState::Starting);
    assert_eq!(lifecycle.state(), ServerState::Running);
}

#[tokio::test]
async fn given_concurrent_stops_when_both_run_then_process_stopped_once() {
    // GIVEN: A running server with a slow stop
    let mock = mock_ping(Duration::ZERO).await;
    let h = harness_with_mock(&mock, fast_config());
    h.supervisor.lifecycle().start().await;
    *h.server.stop_delay.lock().unwrap() = Duration::from_millis(100);

    // WHEN
    let lifecycle = h.supervisor.lifecycle();
    let _ = tokio::join!(lifecycle.stop(), lifecycle.stop());

    // THEN
    assert_eq!(FakeServer::calls(&h.server.stop_calls), 1);
    assert_eq!(lifecycle.state(), ServerState::Stopped);
}

/// **VALUE**: Verifies parallel stops on a multi-threaded runtime stop the process once.
///
/// **WHY THIS MATTERS**: Tauri runs commands on a multi-threaded runtime. A second stop that
/// sees `Running` after the first released its guard calls the process stop again, which
/// for an adopted server means signalling a PID that may already be reused.
///
/// **BUG THIS CATCHES**: Would catch the in-flight guard being released before the state
/// moves to `Stopped`.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_parallel_stops_on_worker_threads_when_repeated_then_one_process_stop_each() {
    // GIVEN
    let h = harness(fast_config());
    let lifecycle = h.supervisor.lifecycle().clone();

    for round in 1..=200 {
        adopt_running(&h).await;

        // WHEN: Two stops race from different worker threads
        let first = tokio::spawn({
            let lifecycle = lifecycle.clone();
            async move { lifecycle.stop().await }
        });
        let second = tokio::spawn({
            let lifecycle = lifecycle.clone();
            async move { lifecycle.stop().await }
        });
        let _ = first.await.expect("first stop");
        let _ = second.await.expect("second stop");

        // THEN
        assert_eq!(
            FakeServer::calls(&h.server.stop_calls),
            round,
            "process stopped more than once in round {round}"
        );
        assert_eq!(lifecycle.state(), ServerState::Stopped);
    }
}

/// **VALUE**: Verifies a failed stop does not pretend the server is gone.
///
/// **WHY THIS MATTERS**: Showing "stopped" while the port is still served would make the
/// next start fail with a confusing bind error.
///
/// **BUG THIS CATCHES**: Would catch publishing `Stopped` before `stop()` succeeds.
#[tokio::test]
async fn given_failing_stop_when_stop_called_then_state_stays_running() {
    // GIVEN
    let mock = mock_ping(Duration::ZERO).await;
    let h = harness_with_mock(&mock, fast_config());
    h.supervisor.lifecycle().start().await;
    h.server.fail_stop.store(true, Ordering::SeqCst);

    // WHEN
    let result = h.supervisor.lifecycle().try_stop().await;

    // THEN
    assert!(matches!(result, Err(LifecycleError::Stop { .. })));
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Running);
}

#[tokio::test]
async fn given_stopped_server_when_stop_called_then_noop() {
    let h = harness(fast_config());

    let state = h.supervisor.lifecycle().stop().await;

    assert_eq!(state, ServerState::Stopped);
    assert_eq!(FakeServer::calls(&h.server.stop_calls), 0);
}

#[tokio::test]
async fn given_stopped_server_when_toggled_twice_then_starts_and_stops() {
    // GIVEN
    let mock = mock_ping(Duration::ZERO).await;
    let h = harness_with_mock(&mock, fast_config());

    // WHEN / THEN
    assert_eq!(h.supervisor.toggle().await, ServerState::Running);
    assert_eq!(h.supervisor.toggle().await, ServerState::Stopped);
    assert_eq!(FakeServer::calls(&h.server.start_calls), 1);
    assert_eq!(FakeServer::calls(&h.server.stop_calls), 1);
}

// ============================================================================
// init()
// ============================================================================

/// **VALUE**: Verifies auto-run starts the server once and announces it.
///
/// **WHY THIS MATTERS**: Users who enable auto-run expect the server up without opening the
/// switch, and a notification telling them so.
///
/// **BUG THIS CATCHES**: Would catch auto-run being ignored or the notification never sent.
#[tokio::test]
async fn given_auto_run_when_activated_then_starts_once_and_notifies() {
    // GIVEN
    let mock = mock_ping(Duration::ZERO).await;
    let mut config = fast_config();
    config.settings.auto_run = true;
    let h = harness_with_mock(&mock, config);

    // WHEN
    let outcome = h.supervisor.activate().await;

    // THEN
    assert_eq!(outcome, InitOutcome::AutoStarted(ServerState::Running));
    assert_eq!(FakeServer::calls(&h.server.init_calls), 1);
    assert_eq!(FakeServer::calls(&h.server.start_calls), 1);
    let notifications = h.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, RUNNING_NOTIFICATION_TITLE);
}

#[tokio::test]
async fn given_auto_run_disabled_when_activated_then_server_not_started() {
    let h = harness(fast_config());

    let outcome = h.supervisor.activate().await;

    assert_eq!(outcome, InitOutcome::Ready);
    assert_eq!(FakeServer::calls(&h.server.start_calls), 0);
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Stopped);
}

/// **VALUE**: Verifies a server left running by a previous launch is adopted.
///
/// **BUG THIS CATCHES**: Would catch a second spawn that fails to bind the port.
#[tokio::test]
async fn given_server_already_running_when_activated_then_adopted_without_start() {
    // GIVEN
    let mut config = fast_config();
    config.settings.auto_run = true;
    let h = harness(config);
    h.server.set_running(true);

    // WHEN
    let outcome = h.supervisor.activate().await;

    // THEN
    assert_eq!(outcome, InitOutcome::AlreadyRunning);
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Running);
    assert_eq!(FakeServer::calls(&h.server.start_calls), 0);
}

/// **VALUE**: Verifies an initialization failure reaches the user.
///
/// **WHY THIS MATTERS**: Without a notice the user sees a switch that does nothing.
///
/// **BUG THIS CATCHES**: Would catch init errors that are only logged.
#[tokio::test]
async fn given_failing_init_when_activated_then_notice_shown() {
    // GIVEN
    let h = harness(fast_config());
    h.server.fail_init.store(true, Ordering::SeqCst);

    // WHEN
    let outcome = h.supervisor.activate().await;

    // THEN
    assert_eq!(outcome, InitOutcome::Failed);
    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].starts_with(INIT_FAILED_NOTICE));
    assert!(notices[0].contains("data directory is read-only"));
}

/// **VALUE**: Verifies restore failures never block startup.
///
/// **BUG THIS CATCHES**: Would catch propagating a restore error out of `init()`.
#[tokio::test]
async fn given_failing_restore_when_activated_with_auto_run_then_server_still_starts() {
    // GIVEN
    let mock = mock_ping(Duration::ZERO).await;
    let mut config = fast_config();
    config.settings.auto_run = true;
    config.settings.restore_on_launch = true;
    let h = harness_with_mock(&mock, config);
    h.server.fail_restore.store(true, Ordering::SeqCst);

    // WHEN
    let outcome = h.supervisor.activate().await;

    // THEN
    assert_eq!(outcome, InitOutcome::AutoStarted(ServerState::Running));
    assert_eq!(FakeServer::calls(&h.server.restore_calls), 1);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn given_failing_notification_when_auto_run_then_outcome_unaffected() {
    let mock = mock_ping(Duration::ZERO).await;
    let mut config = fast_config();
    config.settings.auto_run = true;
    let h = harness_with_mock(&mock, config);
    h.notifier.fail_schedule.store(true, Ordering::SeqCst);

    let outcome = h.supervisor.activate().await;

    assert_eq!(outcome, InitOutcome::AutoStarted(ServerState::Running));
}

// ============================================================================
// refresh()
// ============================================================================

#[tokio::test]
async fn given_server_died_when_refreshed_then_state_is_stopped() {
    // GIVEN
    let mock = mock_ping(Duration::ZERO).await;
    let h = harness_with_mock(&mock, fast_config());
    h.supervisor.lifecycle().start().await;

    // WHEN: The process exits on its own
    h.server.set_running(false);
    let state = h.supervisor.lifecycle().refresh().await;

    // THEN
    assert_eq!(state, ServerState::Stopped);
}
