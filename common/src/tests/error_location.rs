use crate::ErrorLocation;

#[track_caller]
fn capture() -> ErrorLocation {
    ErrorLocation::caller()
}

/// **VALUE**: Verifies that `ErrorLocation::caller()` reports the call site, not the helper.
///
/// **WHY THIS MATTERS**: Every error variant in the workspace carries a location. If the
/// helper reported its own position, every error would point into `error_location.rs`.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[track_caller]` from `caller()`.
#[test]
fn given_track_caller_helper_when_capturing_then_reports_call_site() {
    // GIVEN: A #[track_caller] helper
    // WHEN: Capturing through it
    let location = capture();

    // THEN: The location is this test file, with a real position
    assert!(
        location.file.ends_with("tests/error_location.rs"),
        "Should point at the test file, got {}",
        location.file
    );
    assert!(location.line > 0);
    assert!(location.column > 0);
}

/// **VALUE**: Verifies the bracketed `[file:line:column]` display format.
///
/// **WHY THIS MATTERS**: Error messages embed the location at the end; log readers rely on
/// the bracketed form to jump to source.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops a component.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A known location
    let location = ErrorLocation {
        file: "src/lifecycle/mod.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Should produce "[file:line:column]"
    assert_eq!(formatted, "[src/lifecycle/mod.rs:42:7]");
}
