use crate::{ModelError, ServerEndpointBuilder};

/// **VALUE**: Verifies that builder validation rejects a zero port.
///
/// **WHY THIS MATTERS**: Port 0 means "any port" to the OS; the browser URL and the
/// liveness probe would both point nowhere.
///
/// **BUG THIS CATCHES**: Would catch the zero-port check being dropped during refactoring.
#[test]
fn given_zero_port_when_building_endpoint_then_returns_validation_error() {
    // GIVEN: Builder with port zero
    let builder = ServerEndpointBuilder::default()
        .with_host("127.0.0.1")
        .with_port(0);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Port must be non-zero");
        }
        Ok(endpoint) => panic!("Expected validation error, got {endpoint:?}"),
    }
}

#[test]
fn given_missing_host_when_building_then_returns_validation_error() {
    // GIVEN: Builder without host
    let builder = ServerEndpointBuilder::default().with_port(5244);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Host is reported as missing
    match result {
        Err(ModelError::Validation { message, .. }) => assert_eq!(message, "Host is required"),
        Ok(endpoint) => panic!("Expected validation error, got {endpoint:?}"),
    }
}

/// **VALUE**: Verifies browser URLs are built the same way whether or not the relative
/// path carries a leading slash.
///
/// **BUG THIS CATCHES**: Would catch `http://127.0.0.1:5244dav` style concatenation bugs.
#[test]
fn given_valid_endpoint_when_url_for_called_then_joins_paths() {
    // GIVEN: The loopback endpoint
    let endpoint = ServerEndpointBuilder::default()
        .with_host("127.0.0.1")
        .with_port(5244)
        .build()
        .unwrap();

    // WHEN/THEN: Paths are joined with exactly one slash
    assert_eq!(endpoint.base_url(), "http://127.0.0.1:5244");
    assert_eq!(endpoint.url_for("/ping"), "http://127.0.0.1:5244/ping");
    assert_eq!(endpoint.url_for("dav"), "http://127.0.0.1:5244/dav");
    assert_eq!(endpoint.url_for("/"), "http://127.0.0.1:5244/");
}
