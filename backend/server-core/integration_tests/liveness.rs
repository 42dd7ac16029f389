use crate::fakes::{FakeServer, fast_config, harness_with_mock};

use server_core::error::lifecycle::LifecycleError;
use server_core::error::liveness::LivenessError;
use server_core::lifecycle::liveness::{LivenessConfig, LivenessProbe};

use common::HttpStatusCode;
use models::{ServerEndpointBuilder, ServerState};

use std::time::{Duration, Instant};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// /ping readiness: status handling and the bounded retry budget
// ============================================================================

/// `/ping` answers `status` for the first `times` requests, then 200.
async fn warming_up_ping(status: u16, times: u64) -> MockServer {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(times)
        .with_priority(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .with_priority(2)
        .mount(&mock)
        .await;
    mock
}

async fn failing_ping(status: u16) -> MockServer {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&mock)
        .await;
    mock
}

fn probe_for(mock: &MockServer, config: LivenessConfig) -> LivenessProbe {
    let address = mock.address();
    let endpoint = ServerEndpointBuilder::default()
        .with_host(address.ip().to_string())
        .with_port(address.port())
        .build()
        .expect("endpoint");
    LivenessProbe::new(&endpoint, config).expect("probe")
}

/// **VALUE**: Verifies a non-2xx `/ping` answer is a failed probe carrying the status.
///
/// **WHY THIS MATTERS**: A server that answers 500 is up but broken; reporting it as ready
/// would send the browser to an error page.
///
/// **BUG THIS CATCHES**: Would catch any HTTP answer being taken as readiness.
#[tokio::test]
async fn given_ping_answers_500_when_checked_then_status_error() {
    // GIVEN
    let mock = failing_ping(500).await;
    let probe = probe_for(&mock, LivenessConfig::default());

    // WHEN
    let result = probe.check().await;

    // THEN
    match result {
        Err(LivenessError::Status { status, .. }) => {
            assert_eq!(status, HttpStatusCode(500));
            assert!(status.is_server_error());
        }
        other => panic!("Expected a status error, got {other:?}"),
    }
}

/// **VALUE**: Verifies a server that needs a few probes to come up still reaches `Running`.
///
/// **WHY THIS MATTERS**: Slow devices take longer than the fixed delay to bind the port; the
/// retry budget is what keeps them from failing every start.
///
/// **BUG THIS CATCHES**: Would catch the backoff loop giving up after the first failure.
#[tokio::test]
async fn given_ping_fails_twice_when_started_with_retry_budget_then_running() {
    // GIVEN: Two 503s before /ping succeeds, and a 3s retry budget
    let mock = warming_up_ping(503, 2).await;
    let mut config = fast_config();
    config.startup.probe_retry_budget_ms = 3_000;
    let h = harness_with_mock(&mock, config);

    // WHEN
    let state = h.supervisor.lifecycle().start().await;

    // THEN
    assert_eq!(state, ServerState::Running);
    assert_eq!(FakeServer::calls(&h.server.start_calls), 1);
    let requests = mock.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 3);
}

/// **VALUE**: Verifies the same warming-up server fails without a retry budget.
///
/// **BUG THIS CATCHES**: Would catch retries happening when the budget is zero.
#[tokio::test]
async fn given_ping_fails_once_when_started_without_budget_then_stopped_after_one_probe() {
    // GIVEN
    let mock = warming_up_ping(503, 1).await;
    let h = harness_with_mock(&mock, fast_config());

    // WHEN
    let result = h.supervisor.lifecycle().try_start().await;

    // THEN
    assert!(matches!(
        result,
        Err(LifecycleError::NotReady {
            source: LivenessError::Status { .. },
            ..
        })
    ));
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Stopped);
    let requests = mock.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 1);
}

/// **VALUE**: Verifies a server that never becomes ready ends in `Stopped` within the bound.
///
/// **WHY THIS MATTERS**: The switch shows "starting" for the whole wait; it must give up
/// after `startup_delay + retry_budget` plus one probe timeout.
///
/// **BUG THIS CATCHES**: Would catch an unbounded retry loop, or a budget that restarts on
/// every failure.
#[tokio::test]
async fn given_ping_never_ready_when_started_with_retry_budget_then_stopped_within_bound() {
    // GIVEN
    let mock = failing_ping(503).await;
    let mut config = fast_config();
    config.startup.probe_retry_budget_ms = 800;
    let liveness = config.startup.liveness();
    let h = harness_with_mock(&mock, config);

    // WHEN
    let started = Instant::now();
    let result = h.supervisor.lifecycle().try_start().await;
    let elapsed = started.elapsed();

    // THEN
    assert!(matches!(result, Err(LifecycleError::NotReady { .. })));
    assert_eq!(h.supervisor.lifecycle().state(), ServerState::Stopped);

    let bound = liveness.startup_delay + liveness.retry_budget + liveness.probe_timeout;
    assert!(
        elapsed <= bound + Duration::from_millis(500),
        "start took {elapsed:?}, bound is {bound:?}"
    );
    let requests = mock.received_requests().await.expect("recorded requests");
    assert!(requests.len() > 1, "expected retries, got {}", requests.len());
}
