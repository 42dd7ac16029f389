use crate::fakes::{FakeServer, supervisor};

use alist_server::error::AppError;
use alist_server::state::AppState;

use server_core::config::{CONFIG_FILE_NAME, UserSettings};

use models::{AccessInfo, ConnectivityEvent, ConnectivityKind, ServerState};

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

// ============================================================================
// Integration tests for AppState + server-core
// These drive the shell's state without a Tauri runtime
// ============================================================================

fn app_state(config_dir: &TempDir) -> (AppState, Arc<FakeServer>, mpsc::UnboundedReceiver<AccessInfo>) {
    let server = Arc::new(FakeServer::default());
    let (tx, rx) = mpsc::unbounded_channel();
    let state = AppState::new(supervisor(&server), config_dir.path(), move |info| {
        let _ = tx.send(info);
    });
    (state, server, rx)
}

/// **VALUE**: Verifies the status screen is pushed a snapshot when the server comes up.
///
/// **WHY THIS MATTERS**: The UI renders from these snapshots; a missed update leaves the
/// switch showing "stopped" for a running server.
///
/// **BUG THIS CATCHES**: Would catch a publisher that is never spawned or watches the
/// wrong channel.
#[tokio::test]
async fn given_app_state_when_server_adopted_then_running_snapshot_published() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let (state, server, mut snapshots) = app_state(&dir);

    // WHEN: A server from a previous launch is found
    server.running.store(true, Ordering::SeqCst);
    state.supervisor().lifecycle().refresh().await;

    // THEN
    let published = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match snapshots.recv().await {
                Some(info) if info.state == ServerState::Running => return info,
                Some(_) => continue,
                None => panic!("publisher stopped"),
            }
        }
    })
    .await
    .expect("running snapshot within timeout");
    assert_eq!(published.port, 5244);
}

/// **VALUE**: Verifies connectivity reports from the UI reach the network probe.
///
/// **BUG THIS CATCHES**: Would catch the connectivity channel being dropped right after setup,
/// which ends the watcher and freezes the LAN address.
#[tokio::test]
async fn given_wifi_report_when_sent_then_lan_address_published() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let (state, _server, _snapshots) = app_state(&dir);
    let mut identity_rx = state.supervisor().network().subscribe();

    // WHEN
    state
        .connectivity_changed(ConnectivityEvent::new(ConnectivityKind::Wifi))
        .await
        .expect("watcher alive");

    // THEN
    tokio::time::timeout(
        Duration::from_secs(2),
        identity_rx.wait_for(|i| i.address.is_some()),
    )
    .await
    .expect("identity within timeout")
    .expect("channel open");
    assert_eq!(
        state.supervisor().access_info().lan_address.as_deref(),
        Some("10.0.0.7")
    );
}

/// **VALUE**: Verifies settings changed from the status screen survive a restart.
///
/// **BUG THIS CATCHES**: Would catch `update_settings()` changing only in-memory state.
#[tokio::test]
async fn given_new_settings_when_updated_then_persisted_to_config_dir() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let (state, _server, _snapshots) = app_state(&dir);
    assert!(!state.settings().auto_run);

    // WHEN
    let saved = state
        .update_settings(UserSettings {
            auto_run: true,
            restore_on_launch: false,
        })
        .expect("saved");

    // THEN
    assert!(saved.auto_run);
    assert!(state.settings().auto_run);
    assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    assert!(!dir.path().join("config.json").exists());
}

/// **VALUE**: Verifies a corrupted config is reported instead of silently overwritten.
///
/// **BUG THIS CATCHES**: Would catch `update_settings()` replacing a hand-edited config
/// (server paths, backup dir) with defaults.
#[tokio::test]
async fn given_corrupt_config_when_settings_updated_then_config_error() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ broken").expect("write");
    let (state, _server, _snapshots) = app_state(&dir);

    // WHEN
    let result = state.update_settings(UserSettings::default());

    // THEN
    assert!(matches!(result, Err(AppError::Config { .. })));
    let contents = std::fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).expect("read");
    assert_eq!(contents, "{ broken");
}

/// **VALUE**: Verifies a settings update leaves the server's own `config.json` alone.
///
/// **WHY THIS MATTERS**: On macOS and iOS the app config directory doubles as the app data
/// directory. Overwriting AList's `config.json` wipes its jwt secret and database settings.
///
/// **BUG THIS CATCHES**: Would catch the app config sharing AList's file name.
#[tokio::test]
async fn given_server_config_in_same_dir_when_settings_updated_then_server_config_untouched() {
    // GIVEN: AList's config next to where the app config will be written
    let dir = TempDir::new().expect("temp dir");
    let server_config = r#"{"jwt_secret":"k3Y9xP2qLm","database":{"type":"sqlite3"}}"#;
    std::fs::write(dir.path().join("config.json"), server_config).expect("write");
    let (state, _server, _snapshots) = app_state(&dir);

    // WHEN
    state
        .update_settings(UserSettings {
            auto_run: true,
            restore_on_launch: false,
        })
        .expect("saved");

    // THEN
    let contents = std::fs::read_to_string(dir.path().join("config.json")).expect("read");
    assert_eq!(contents, server_config);
    assert!(state.settings().auto_run);
}
