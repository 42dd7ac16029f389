// Unit tests for the embedded browser helpers

use crate::webview::user_agent;

/// **VALUE**: Verifies the web UI can recognise the embedded browser.
///
/// **BUG THIS CATCHES**: Would catch dropping the application name from the user agent.
#[test]
fn given_user_agent_when_built_then_contains_application_name() {
    let ua = user_agent();

    assert!(ua.contains("AListServer/"), "Unexpected user agent: {ua}");
    assert!(ua.starts_with("Mozilla/5.0"));
}
