// Unit tests for error module
// Tests error serialization (critical for Tauri IPC)

use crate::error::AppError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors can be serialized (required for Tauri IPC).
///
/// **WHY THIS MATTERS**: Tauri commands must return serializable errors to send them
/// to the status screen. If serialization breaks, the UI only sees an opaque failure.
///
/// **BUG THIS CATCHES**: Would catch if someone removes the `#[derive(Serialize)]`
/// or adds a non-serializable field.
#[test]
fn given_app_error_when_serialized_then_tagged_with_variant() {
    // GIVEN
    let err = AppError::Browser {
        message: String::from("no session script staged yet"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN
    let json = serde_json::to_value(&err).expect("serializable");

    // THEN: The UI reads `type` and `data.message`
    assert_eq!(json["type"], "Browser");
    assert_eq!(json["data"]["message"], "no session script staged yet");
    assert!(json["data"]["location"].is_object());
}

#[test]
fn given_app_error_when_displayed_then_includes_message_and_location() {
    let err = AppError::Config {
        message: String::from("startup.probe_timeout_ms must be positive"),
        location: ErrorLocation::from(Location::caller()),
    };

    let text = err.to_string();

    assert!(text.starts_with("Config Error: startup.probe_timeout_ms must be positive"));
    assert!(text.contains("error.rs"));
}
