//! Logging for the AList server shell.
//!
//! Colored records go to stdout, plain records to `alist-server.log` in the app
//! log directory. The sidecar's own output is forwarded at `trace`, so the
//! default level keeps it out of the file unless `ALIST_SERVER_LOG=trace`.

use crate::error::AppError;

use common::ErrorLocation;

use std::fmt::Arguments;
use std::fs;
use std::io::stdout;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "alist-server.log";

/// Name the previous log is moved to once it outgrows [`MAX_LOG_BYTES`].
pub const ROTATED_LOG_FILE_NAME: &str = "alist-server.log.1";

pub const MAX_LOG_BYTES: u64 = 4 * 1024 * 1024;

/// Environment override for the level, e.g. `ALIST_SERVER_LOG=trace`.
pub const LOG_LEVEL_ENV: &str = "ALIST_SERVER_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize the logger once per process.
///
/// Later calls log a warning and return Ok, which matters on mobile where
/// setup can run again when the activity is recreated.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created, or the
/// global logger cannot be installed.
pub fn initialize(log_dir: &Path) -> Result<(), AppError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        let level = level_from(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
        result = install(log_dir, level);
        if result.is_ok() {
            info!("Logger initialized with level {level:?} in {}", log_dir.display());
        }
    });

    result
}

/// Resolves the level from an optional override, falling back to the build default.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Moves an oversized log aside so the new session starts a fresh file.
///
/// Returns the path of the rotated file when a rotation happened.
#[track_caller]
pub fn rotate_if_oversized(log_dir: &Path, max_bytes: u64) -> Result<Option<PathBuf>, AppError> {
    let current = log_dir.join(LOG_FILE_NAME);
    let Ok(metadata) = fs::metadata(&current) else {
        return Ok(None);
    };
    if metadata.len() <= max_bytes {
        return Ok(None);
    }

    let rotated = log_dir.join(ROTATED_LOG_FILE_NAME);
    fs::rename(&current, &rotated).map_err(|e| AppError::App {
        message: format!("Failed to rotate log {}: {e}", current.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;
    Ok(Some(rotated))
}

fn format_record(out: FormatCallback, message: &Arguments, record: &Record, level: &dyn std::fmt::Display) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}

#[track_caller]
fn install(log_dir: &Path, level: LevelFilter) -> Result<(), AppError> {
    fs::create_dir_all(log_dir).map_err(|e| AppError::App {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;
    rotate_if_oversized(log_dir, MAX_LOG_BYTES)?;

    let log_file_path = log_dir.join(LOG_FILE_NAME);
    let log_file = fern::log_file(&log_file_path).map_err(|e| AppError::App {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            format_record(out, message, record, &colors.color(record.level()))
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| format_record(out, message, record, &record.level()))
        .chain(log_file);

    // HTTP internals are noisy at debug; the /ping probe alone would flood the file.
    Dispatch::new()
        .level(level)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("tao", LevelFilter::Info)
        .level_for("wry", LevelFilter::Info)
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| AppError::App {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}
