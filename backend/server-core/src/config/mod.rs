use crate::ALIST_BINARY;
use crate::error::config::ConfigError;
use crate::lifecycle::StartupSettings;
use crate::lifecycle::liveness::LivenessConfig;
use crate::process::sidecar::SidecarConfig;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// The app's own settings file. AList keeps a `config.json` of its own in the
/// server data directory, so the two must never share a name.
pub const CONFIG_FILE_NAME: &str = "alist-server.json";

/// Subdirectory of the app data directory that AList owns.
pub const SERVER_DATA_DIR_NAME: &str = "alist";

const CONFIG_VERSION: u32 = 1;
const DATA_DIR_NAME: &str = "alist-server";
const MAX_STARTUP_DELAY_MS: u64 = 60_000;
const MAX_PROBE_RETRY_BUDGET_MS: u64 = 120_000;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            data_dir: None,
            backup_dir: None,
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

/// User toggles persisted between launches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSettings {
    #[serde(default)]
    pub auto_run: bool,
    #[serde(default)]
    pub restore_on_launch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartupConfig {
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default)]
    pub probe_retry_budget_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_retry_budget_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrowserConfig {
    #[serde(default = "default_initial_path")]
    pub initial_path: String,
    #[serde(default = "default_external_schemes")]
    pub external_schemes: Vec<String>,
    /// How long the page gets to answer a heartbeat before it is reloaded.
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
}

impl BrowserConfig {
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            initial_path: default_initial_path(),
            external_schemes: default_external_schemes(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub settings: UserSettings,

    #[serde(default)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            settings: UserSettings::default(),
            startup: StartupConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_binary() -> String {
    ALIST_BINARY.to_string()
}
fn default_command_timeout_ms() -> u64 {
    10_000
}
fn default_startup_delay_ms() -> u64 {
    500
}
fn default_probe_timeout_ms() -> u64 {
    1_000
}
fn default_heartbeat_timeout_ms() -> u64 {
    3_000
}
fn default_initial_path() -> String {
    "/".to_string()
}
fn default_external_schemes() -> Vec<String> {
    ["mailto", "tel", "sms", "vlc", "infuse", "nplayer-http"]
        .into_iter()
        .map(String::from)
        .collect()
}

// ============================================
// CONVERSIONS
// ============================================

impl StartupConfig {
    pub fn liveness(&self) -> LivenessConfig {
        LivenessConfig {
            startup_delay: Duration::from_millis(self.startup_delay_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            retry_budget: Duration::from_millis(self.probe_retry_budget_ms),
        }
    }
}

impl UserSettings {
    pub fn startup(&self) -> StartupSettings {
        StartupSettings {
            auto_run: self.auto_run,
            restore_on_launch: self.restore_on_launch,
        }
    }
}

impl ServerConfig {
    /// Sidecar settings. Without an explicit `data_dir`, AList gets its own
    /// subdirectory of `app_data_dir`.
    pub fn sidecar(&self, app_data_dir: &Path) -> SidecarConfig {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| app_data_dir.join(SERVER_DATA_DIR_NAME));

        SidecarConfig {
            binary: PathBuf::from(&self.binary),
            backup_dir: self.backup_dir.clone(),
            command_timeout: Duration::from_millis(self.command_timeout_ms),
            ..SidecarConfig::new(data_dir)
        }
    }
}

/// Per-user app directory, used when the host cannot resolve its own.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DATA_DIR_NAME)
}

// ============================================
// IMPLEMENTATION
// ============================================

impl AppConfig {
    /// Load config from {config_dir}/alist-server.json.
    ///
    /// A missing file yields defaults. A corrupted or invalid one is an error,
    /// and so is JSON with fields this app does not know.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        let config: AppConfig = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            reason: e.to_string(),
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// [`load`](Self::load), falling back to defaults on any error.
    pub fn load_or_default(config_dir: &Path) -> Self {
        Self::load(config_dir).unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {e}");
            Self::default()
        })
    }

    /// Save config to {config_dir}/alist-server.json (temp file + rename).
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation(format!(
                "Invalid version: {} (expected 1-{CONFIG_VERSION})",
                self.version
            )));
        }

        if self.server.binary.trim().is_empty() {
            return Err(validation("server.binary cannot be empty".to_string()));
        }

        if self.server.command_timeout_ms == 0 {
            return Err(validation("server.command_timeout_ms must be positive".to_string()));
        }

        if self.startup.probe_timeout_ms == 0 {
            return Err(validation("startup.probe_timeout_ms must be positive".to_string()));
        }

        if self.startup.startup_delay_ms > MAX_STARTUP_DELAY_MS {
            return Err(validation(format!(
                "startup.startup_delay_ms too large: {} (max {MAX_STARTUP_DELAY_MS})",
                self.startup.startup_delay_ms
            )));
        }

        if self.startup.probe_retry_budget_ms > MAX_PROBE_RETRY_BUDGET_MS {
            return Err(validation(format!(
                "startup.probe_retry_budget_ms too large: {} (max {MAX_PROBE_RETRY_BUDGET_MS})",
                self.startup.probe_retry_budget_ms
            )));
        }

        if !self.browser.initial_path.starts_with('/') {
            return Err(validation(format!(
                "browser.initial_path must start with '/': {}",
                self.browser.initial_path
            )));
        }

        for scheme in &self.browser.external_schemes {
            let valid = !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if !valid {
                return Err(validation(format!("Invalid external scheme: '{scheme}'")));
            }
        }

        Ok(())
    }
}

#[track_caller]
fn validation(reason: String) -> ConfigError {
    ConfigError::Validation {
        location: ErrorLocation::from(Location::caller()),
        reason,
    }
}
