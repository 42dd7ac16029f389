// Unit tests for config loading, saving and validation

use crate::config::{AppConfig, CONFIG_FILE_NAME, SERVER_DATA_DIR_NAME, default_data_dir};
use crate::error::config::ConfigError;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

/// **VALUE**: Verifies a first launch works without a config file.
///
/// **WHY THIS MATTERS**: Fresh installs have no config; failing here would block activation.
///
/// **BUG THIS CATCHES**: Would catch `load()` treating a missing file as a read error.
#[test]
fn given_missing_file_when_load_called_then_returns_defaults() {
    // GIVEN: An empty config directory
    let dir = TempDir::new().expect("temp dir");

    // WHEN
    let config = AppConfig::load(dir.path()).expect("defaults");

    // THEN
    assert_eq!(config.version, 1);
    assert!(!config.settings.auto_run);
    assert!(!config.settings.restore_on_launch);
    assert_eq!(config.startup.startup_delay_ms, 500);
    assert_eq!(config.startup.probe_timeout_ms, 1_000);
    assert_eq!(config.browser.initial_path, "/");
    assert!(config.browser.external_schemes.iter().any(|s| s == "mailto"));
}

/// **VALUE**: Verifies user settings survive a save/load cycle.
///
/// **WHY THIS MATTERS**: The auto-run toggle is the one setting users change; losing it means
/// the server silently stops starting on launch.
///
/// **BUG THIS CATCHES**: Would catch `save()` writing to the temp file without renaming it.
#[test]
fn given_saved_settings_when_loaded_then_settings_preserved() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let mut config = AppConfig::default();
    config.settings.auto_run = true;
    config.server.backup_dir = Some(PathBuf::from("/backups/alist"));

    // WHEN
    config.save(dir.path()).expect("save");
    let loaded = AppConfig::load(dir.path()).expect("load");

    // THEN
    assert!(loaded.settings.auto_run);
    assert_eq!(loaded.server.backup_dir, Some(PathBuf::from("/backups/alist")));
    assert!(!dir.path().join(format!("{CONFIG_FILE_NAME}.tmp")).exists());
}

/// **VALUE**: Verifies partial files are completed with defaults.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` on a section.
#[test]
fn given_partial_json_when_loaded_then_missing_fields_defaulted() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "settings": { "auto_run": true } }"#,
    )
    .expect("write");

    // WHEN
    let config = AppConfig::load(dir.path()).expect("load");

    // THEN
    assert!(config.settings.auto_run);
    assert_eq!(config.server.binary, "alist");
    assert_eq!(config.server.command_timeout_ms, 10_000);
    assert_eq!(config.startup.probe_retry_budget_ms, 0);
    assert_eq!(config.browser.heartbeat_timeout(), Duration::from_secs(3));
}

#[test]
fn given_corrupt_file_when_load_called_then_parse_error() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").expect("write");

    // WHEN
    let result = AppConfig::load(dir.path());

    // THEN
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

/// **VALUE**: Verifies a broken config never blocks startup.
///
/// **BUG THIS CATCHES**: Would catch `load_or_default()` propagating a parse error.
#[test]
fn given_corrupt_file_when_load_or_default_called_then_returns_defaults() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "not json at all").expect("write");

    let config = AppConfig::load_or_default(dir.path());

    assert!(!config.settings.auto_run);
}

#[test]
fn given_zero_probe_timeout_when_validated_then_validation_error() {
    let mut config = AppConfig::default();
    config.startup.probe_timeout_ms = 0;

    assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
}

#[test]
fn given_invalid_scheme_when_validated_then_validation_error() {
    let mut config = AppConfig::default();
    config.browser.external_schemes.push("bad scheme".to_string());

    assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
}

#[test]
fn given_relative_initial_path_when_validated_then_validation_error() {
    let mut config = AppConfig::default();
    config.browser.initial_path = "storage".to_string();

    assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
}

/// **VALUE**: Verifies invalid configs are never written to disk.
///
/// **BUG THIS CATCHES**: Would catch `save()` skipping validation.
#[test]
fn given_invalid_config_when_saved_then_nothing_written() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = AppConfig::default();
    config.version = 99;

    let result = config.save(dir.path());

    assert!(matches!(result, Err(ConfigError::Validation { .. })));
    assert!(!dir.path().join(CONFIG_FILE_NAME).exists());
}

#[test]
fn given_startup_config_when_converted_then_liveness_durations_match() {
    let mut config = AppConfig::default();
    config.startup.probe_retry_budget_ms = 3_000;

    let liveness = config.startup.liveness();

    assert_eq!(liveness.startup_delay, Duration::from_millis(500));
    assert_eq!(liveness.probe_timeout, Duration::from_secs(1));
    assert_eq!(liveness.retry_budget, Duration::from_secs(3));
}

/// **VALUE**: Verifies AList gets its own subdirectory of the app data directory unless overridden.
///
/// **WHY THIS MATTERS**: On macOS and iOS the app config and app data directories are the same
/// path. AList writes its own `config.json` (jwt secret, database settings) into its data dir.
///
/// **BUG THIS CATCHES**: Would catch the sidecar using the app directory itself, or the override
/// and fallback being swapped.
#[test]
fn given_server_config_when_sidecar_built_then_data_dir_resolved() {
    // GIVEN
    let app_data = Path::new("/app/data");
    let mut config = AppConfig::default();

    // WHEN / THEN: no override
    assert_eq!(
        config.server.sidecar(app_data).data_dir,
        app_data.join(SERVER_DATA_DIR_NAME)
    );

    // WHEN / THEN: override wins
    config.server.data_dir = Some(PathBuf::from("/custom"));
    let sidecar = config.server.sidecar(app_data);
    assert_eq!(sidecar.data_dir, PathBuf::from("/custom"));
    assert_eq!(sidecar.command_timeout, Duration::from_secs(10));
}

#[test]
fn given_any_host_when_default_data_dir_called_then_ends_with_app_dir() {
    assert!(default_data_dir().ends_with("alist-server"));
}

/// **VALUE**: Verifies the app's settings file never shares a name with AList's own config.
#[test]
fn given_config_file_name_when_read_then_distinct_from_server_config() {
    assert_ne!(CONFIG_FILE_NAME, "config.json");
    assert_eq!(CONFIG_FILE_NAME, "alist-server.json");
}

/// **VALUE**: Verifies JSON written by another program is rejected instead of read as defaults.
///
/// **WHY THIS MATTERS**: Accepting AList's `config.json` as an empty app config means the next
/// settings update overwrites it, destroying the server's jwt secret and database settings.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(deny_unknown_fields)]`, and `save()`
/// after a failed load clobbering a foreign file.
#[test]
fn given_foreign_server_config_when_loaded_then_parse_error_and_file_untouched() {
    // GIVEN: An AList-style config sitting where the app config lives
    let dir = TempDir::new().expect("temp dir");
    let foreign = r#"{
  "force": false,
  "site_url": "",
  "jwt_secret": "k3Y9xP2qLm",
  "token_expires_in": 48,
  "database": { "type": "sqlite3", "db_file": "data/data.db" }
}"#;
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, foreign).expect("write");

    // WHEN
    let result = AppConfig::load(dir.path());

    // THEN: Refused, and the file is still AList's
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
    let contents = std::fs::read_to_string(&path).expect("read");
    assert!(contents.contains("jwt_secret"));
}

/// **VALUE**: Verifies unknown keys inside a known section are rejected too.
///
/// **BUG THIS CATCHES**: Would catch `deny_unknown_fields` only on the top-level struct.
#[test]
fn given_unknown_section_field_when_loaded_then_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "settings": { "auto_run": true, "db_file": "data.db" } }"#,
    )
    .expect("write");

    assert!(matches!(
        AppConfig::load(dir.path()),
        Err(ConfigError::Parse { .. })
    ));
}
