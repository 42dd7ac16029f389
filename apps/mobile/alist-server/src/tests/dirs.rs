// Unit tests for app directory resolution

use crate::resolve_app_dir;

use server_core::config::default_data_dir;

use std::path::PathBuf;

/// **VALUE**: Verifies the host's directory is used when Tauri resolves it.
#[test]
fn given_host_dir_when_resolved_then_used_as_is() {
    // GIVEN
    let host = PathBuf::from("/host/app-data");

    // WHEN
    let dir = resolve_app_dir(Ok(host.clone()), "data");

    // THEN
    assert_eq!(dir, host);
}

/// **VALUE**: Verifies a host without app directories still gets a usable location.
///
/// **WHY THIS MATTERS**: Setup aborts when no directory can be resolved, and the server
/// never starts.
///
/// **BUG THIS CATCHES**: Would catch the fallback being dropped in favour of an error.
#[test]
fn given_unknown_host_dir_when_resolved_then_falls_back_to_user_data_dir() {
    // GIVEN / WHEN
    let dir = resolve_app_dir(Err(tauri::Error::UnknownPath), "config");

    // THEN
    assert_eq!(dir, default_data_dir());
}
