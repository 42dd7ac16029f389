// Unit tests for the single-writer observable cell

use crate::observable::StateCell;

/// **VALUE**: Verifies subscribers are only woken by real changes.
///
/// **WHY THIS MATTERS**: Focus events re-resolve credentials every time; waking every
/// subscriber with an identical value would re-render the UI for nothing.
///
/// **BUG THIS CATCHES**: Would catch `replace_if_changed()` notifying on equal values.
#[tokio::test]
async fn given_same_value_when_replace_if_changed_then_subscribers_not_notified() {
    // GIVEN
    let cell = StateCell::new(5_u32);
    let mut rx = cell.subscribe();
    rx.borrow_and_update();

    // WHEN
    let changed = cell.replace_if_changed(5);

    // THEN
    assert!(!changed);
    assert!(!rx.has_changed().expect("sender alive"));
}

#[tokio::test]
async fn given_new_value_when_replace_if_changed_then_subscribers_see_it() {
    // GIVEN
    let cell = StateCell::new(5_u32);
    let mut rx = cell.subscribe();
    rx.borrow_and_update();

    // WHEN
    let changed = cell.replace_if_changed(7);

    // THEN
    assert!(changed);
    assert!(rx.has_changed().expect("sender alive"));
    assert_eq!(*rx.borrow_and_update(), 7);
    assert_eq!(cell.get(), 7);
}

/// **VALUE**: Verifies a rejected transition leaves the value untouched.
///
/// **WHY THIS MATTERS**: The lifecycle's start guard relies on `transition()` to claim
/// `Stopped -> Starting` atomically; a rejected claim must not be visible to anyone.
///
/// **BUG THIS CATCHES**: Would catch a transition that writes before deciding.
#[test]
fn given_rejecting_transition_when_applied_then_value_unchanged() {
    // GIVEN
    let cell = StateCell::new(String::from("stopped"));

    // WHEN
    let applied = cell.transition(|s| s.as_str() == "running");

    // THEN
    assert!(!applied);
    assert_eq!(cell.get(), "stopped");
}

#[test]
fn given_no_subscribers_when_set_then_value_is_stored() {
    let cell: StateCell<Option<u8>> = StateCell::default();

    cell.set(Some(1));

    assert_eq!(cell.get(), Some(1));
}
