// Unit tests for heartbeat rounds

use crate::session::watchdog::{ContentWatchdog, HEARTBEAT_COMMAND, heartbeat_script};

/// **VALUE**: Verifies each round is answered at most once and only by its own number.
///
/// **BUG THIS CATCHES**: Would catch a second answer, or an answer to a replaced round,
/// counting as proof that the page is alive.
#[test]
fn given_armed_round_when_answered_then_settled_once() {
    // GIVEN
    let watchdog = ContentWatchdog::new();
    let first = watchdog.arm();
    let second = watchdog.arm();

    // WHEN / THEN
    assert_ne!(first, second);
    assert!(!watchdog.acknowledge(first), "replaced round must not settle");
    assert!(watchdog.acknowledge(second));
    assert!(!watchdog.acknowledge(second));
    assert!(!watchdog.expire(second));
}

#[test]
fn given_unanswered_round_when_expired_then_reported_once() {
    let watchdog = ContentWatchdog::new();
    let seq = watchdog.arm();

    assert!(watchdog.expire(seq));
    assert!(!watchdog.expire(seq));
}

/// **VALUE**: Verifies the heartbeat calls back with its number and the page location.
///
/// **WHY THIS MATTERS**: The answer is also how in-page route changes reach the current-page
/// tracking.
#[test]
fn given_sequence_when_heartbeat_script_built_then_invokes_command_with_seq_and_url() {
    // GIVEN / WHEN
    let script = heartbeat_script(7);

    // THEN
    assert!(script.contains(&format!("invoke(\"{HEARTBEAT_COMMAND}\"")));
    assert!(script.contains("seq: 7"));
    assert!(script.contains("url: window.location.href"));
    assert!(script.ends_with("true;"));
}
