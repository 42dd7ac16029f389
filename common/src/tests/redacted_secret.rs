use crate::RedactedSecret;

/// **VALUE**: Admin passwords and session tokens must never reach log files.
///
/// **WHY THIS MATTERS**: Lifecycle and session code logs liberally with `{:?}`; a derived
/// Debug on the secret would leak the admin password into `alist-server.log`.
///
/// **BUG THIS CATCHES**: Would catch someone replacing the manual Debug/Display impls with
/// `#[derive(Debug)]`.
#[test]
fn given_secret_when_formatted_then_value_is_hidden() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("hunter2");

    // WHEN: Formatting with Debug and Display
    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    // THEN: Neither contains the value
    assert!(!debug.contains("hunter2"));
    assert!(!display.contains("hunter2"));
    assert_eq!(secret.as_str(), "hunter2");
    assert_eq!(secret.len(), 7);
}

/// **VALUE**: Serializing a secret is refused so it cannot slip into an IPC payload.
///
/// **BUG THIS CATCHES**: Would catch a `#[derive(Serialize)]` sneaking onto the type.
#[test]
fn given_secret_when_serialized_then_fails() {
    // GIVEN: A secret
    let secret = RedactedSecret::from("token-value");

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&secret);

    // THEN: Serialization errors out
    assert!(result.is_err(), "Secrets must not serialize");
}
