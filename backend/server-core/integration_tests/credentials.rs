use crate::fakes::{FakeServer, adopt_running, fast_config, harness};

use server_core::DEFAULT_ADMIN_PASSWORD;
use server_core::error::credentials::CredentialError;

/// **VALUE**: Verifies first boot provisions the default password.
///
/// **WHY THIS MATTERS**: A fresh server has no password; without provisioning the user has
/// no way to log into the web UI or WebDAV.
///
/// **BUG THIS CATCHES**: Would catch returning the empty password to the user.
#[tokio::test]
async fn given_empty_password_when_resolved_then_default_is_set_and_returned() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    h.server.set_password("");

    // WHEN
    let credentials = h.supervisor.credentials().resolve().await.expect("credentials");

    // THEN
    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password.as_str(), DEFAULT_ADMIN_PASSWORD);
    assert_eq!(FakeServer::calls(&h.server.set_password_calls), 1);
    assert_eq!(*h.server.password.lock().unwrap(), DEFAULT_ADMIN_PASSWORD);
}

/// **VALUE**: Verifies later resolutions return what the server reports.
///
/// **WHY THIS MATTERS**: Users change the password in the web UI; the status screen must
/// follow instead of showing the default forever.
///
/// **BUG THIS CATCHES**: Would catch caching the provisioned password or provisioning again.
#[tokio::test]
async fn given_password_changed_on_server_when_resolved_again_then_new_password_returned() {
    // GIVEN
    let h = harness(fast_config());
    adopt_running(&h).await;
    h.server.set_password("");
    h.supervisor.credentials().resolve().await.expect("first resolve");

    // WHEN
    h.server.set_password("changed-in-ui");
    let credentials = h.supervisor.credentials().resolve().await.expect("second resolve");

    // THEN
    assert_eq!(credentials.password.as_str(), "changed-in-ui");
    assert_eq!(FakeServer::calls(&h.server.set_password_calls), 1);
    assert_eq!(
        h.supervisor.credentials().current().map(|c| c.password.as_str().to_string()),
        Some("changed-in-ui".to_string())
    );
}

#[tokio::test]
async fn given_stopped_server_when_resolved_then_not_running_error() {
    let h = harness(fast_config());

    let result = h.supervisor.credentials().resolve().await;

    assert!(matches!(result, Err(CredentialError::NotRunning { .. })));
    assert!(h.supervisor.credentials().current().is_none());
}

/// **VALUE**: Verifies the password never leaks into logs via `Debug`.
///
/// **BUG THIS CATCHES**: Would catch deriving `Debug` on the raw password string.
#[tokio::test]
async fn given_resolved_credentials_when_debug_formatted_then_password_redacted() {
    let h = harness(fast_config());
    adopt_running(&h).await;

    let credentials = h.supervisor.credentials().resolve().await.expect("credentials");

    let debug = format!("{credentials:?}");
    assert!(!debug.contains("hunter2"), "Password leaked: {debug}");
}
