use crate::HttpStatusCode;

/// **VALUE**: Verifies the status families used to classify liveness probe failures.
///
/// **BUG THIS CATCHES**: Would catch off-by-one range errors (e.g. treating 300 as success).
#[test]
fn given_status_codes_when_classified_then_families_are_disjoint() {
    // GIVEN: Boundary codes
    let cases = [
        (200, true, false, false),
        (299, true, false, false),
        (300, false, false, false),
        (404, false, true, false),
        (503, false, false, true),
    ];

    // WHEN/THEN: Each code lands in exactly the expected family
    for (code, success, client, server) in cases {
        let status = HttpStatusCode::from(code);
        assert_eq!(status.is_success(), success, "success for {code}");
        assert_eq!(status.is_client_error(), client, "client for {code}");
        assert_eq!(status.is_server_error(), server, "server for {code}");
    }
}

#[test]
fn given_gateway_errors_when_checked_then_transient() {
    assert!(HttpStatusCode(503).is_transient());
    assert!(HttpStatusCode(502).is_transient());
    assert!(!HttpStatusCode(500).is_transient());
    assert!(!HttpStatusCode(401).is_transient());
}
