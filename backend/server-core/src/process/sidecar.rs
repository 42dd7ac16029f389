use crate::error::process::ProcessError;
use crate::process::ServerProcess;
use crate::process::listener::{server_pid, signal_terminate, stop_pid};
use crate::{ALIST_BINARY, SERVER_PORT};

use common::ErrorLocation;

use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, trace, warn};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;
use tokio::time::timeout;

const SERVER_COMMAND: &str = "server";
const ADMIN_COMMAND: &str = "admin";
const ADMIN_SET_SUBCOMMAND: &str = "set";
const ADMIN_TOKEN_SUBCOMMAND: &str = "token";
const DATA_FLAG: &str = "--data";
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(5);
const USERNAME_PATTERN: &str = r"(?mi)^.*?username:[ \t]*(?P<value>\S+)";
const PASSWORD_PATTERN: &str = r"(?mi)^.*?password:[ \t]*(?P<value>\S*)";
const TOKEN_PATTERN: &str = r"(?mi)admin token:[ \t]*(?P<value>\S+)";
const INITIAL_PASSWORD_PATTERN: &str = r"(?mi)initial password is:[ \t]*(?P<value>\S+)";
const CAPTURE_VALUE: &str = "value";

/// File in the data directory holding the admin password this app last set.
///
/// Servers from 3.25 on store only a hash, so this is the one place the
/// current password can be read back from.
pub const PROVISIONED_PASSWORD_FILE: &str = "alist-server.admin";

/// Reported when the server holds a password this app never provisioned.
pub const WITHHELD_PASSWORD: &str = "********";

/// Files that make up the server's persistent state, in restore order.
const RESTORE_FILES: &[&str] = &[
    "config.json",
    "data.db",
    "data.db-shm",
    "data.db-wal",
    PROVISIONED_PASSWORD_FILE,
];

static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
static PASSWORD_REGEX: OnceLock<Regex> = OnceLock::new();
static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
static INITIAL_PASSWORD_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn username_regex() -> &'static Regex {
    USERNAME_REGEX.get_or_init(|| Regex::new(USERNAME_PATTERN).expect("valid regex pattern"))
}

pub(crate) fn password_regex() -> &'static Regex {
    PASSWORD_REGEX.get_or_init(|| Regex::new(PASSWORD_PATTERN).expect("valid regex pattern"))
}

pub(crate) fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("valid regex pattern"))
}

pub(crate) fn initial_password_regex() -> &'static Regex {
    INITIAL_PASSWORD_REGEX
        .get_or_init(|| Regex::new(INITIAL_PASSWORD_PATTERN).expect("valid regex pattern"))
}

/// What `alist admin` says about the admin password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PasswordReport {
    /// Printed as stored (servers before 3.25). Empty means never set.
    Plain(String),
    /// The admin user was created by this very invocation.
    Created,
    /// Only a hash is stored.
    Withheld,
}

pub(crate) fn password_report(output: &str) -> PasswordReport {
    if initial_password_regex().is_match(output) {
        return PasswordReport::Created;
    }

    match capture_value(password_regex(), output) {
        Some(password) => PasswordReport::Plain(password),
        None => PasswordReport::Withheld,
    }
}

pub(crate) fn capture_value(re: &Regex, output: &str) -> Option<String> {
    re.captures(output)
        .and_then(|caps| caps.name(CAPTURE_VALUE))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone)]
pub struct SidecarConfig {
    pub binary: PathBuf,
    pub data_dir: PathBuf,
    pub backup_dir: Option<PathBuf>,
    pub port: u16,
    pub command_timeout: Duration,
}

impl SidecarConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from(ALIST_BINARY),
            data_dir: data_dir.into(),
            backup_dir: None,
            port: SERVER_PORT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

pub(crate) fn build_server_command(config: &SidecarConfig) -> TokioCommand {
    let mut cmd = TokioCommand::new(&config.binary);
    cmd.arg(SERVER_COMMAND)
        .arg(DATA_FLAG)
        .arg(&config.data_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

pub(crate) fn build_admin_command(config: &SidecarConfig, args: &[&str]) -> TokioCommand {
    let mut cmd = TokioCommand::new(&config.binary);
    cmd.arg(ADMIN_COMMAND)
        .args(args)
        .arg(DATA_FLAG)
        .arg(&config.data_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Traces the server's output line by line.
///
/// The line announcing a freshly created admin user carries its password; it
/// is not logged, only recorded in `admin_created`.
fn forward_output<R>(stream: R, label: &'static str, admin_created: Arc<AtomicBool>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    TokioSpawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if initial_password_regex().is_match(&line) {
                info!("Server created its admin user");
                admin_created.store(true, Ordering::SeqCst);
                continue;
            }
            trace!("Server {label}: {line}");
        }
    });
}

/// AList running as a child process of this app.
///
/// Admin primitives are one-shot `alist admin ... --data <dir>` invocations
/// whose output is parsed. A server left behind by a previous launch is
/// detected through the port it listens on and can be stopped as well.
pub struct SidecarServer {
    config: SidecarConfig,
    child: Mutex<Option<TokioChild>>,
    admin_created: Arc<AtomicBool>,
}

impl SidecarServer {
    pub fn new(config: SidecarConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
            admin_created: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SidecarConfig {
        &self.config
    }

    fn provisioned_path(&self) -> PathBuf {
        self.config.data_dir.join(PROVISIONED_PASSWORD_FILE)
    }

    async fn read_provisioned(&self) -> Result<Option<String>, ProcessError> {
        let path = self.provisioned_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let password = contents.trim_end_matches(['\r', '\n']);
                Ok((!password.is_empty()).then(|| password.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProcessError::Io {
                message: format!("Failed to read {}: {e}", path.display()),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            }),
        }
    }

    async fn write_provisioned(&self, password: &str) -> std::io::Result<()> {
        let path = self.provisioned_path();
        tokio::fs::write(&path, password).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }

    async fn run_admin(&self, args: &[&str]) -> Result<String, ProcessError> {
        let subcommand = args.first().copied().unwrap_or("info");
        debug!("Running {ALIST_BINARY} {ADMIN_COMMAND} {subcommand}");

        let output = timeout(
            self.config.command_timeout,
            build_admin_command(&self.config, args).output(),
        )
        .await
        .map_err(|_| ProcessError::Timeout {
            message: format!(
                "'{ADMIN_COMMAND} {subcommand}' did not finish within {:?}",
                self.config.command_timeout
            ),
            location: ErrorLocation::from(Location::caller()),
        })?
        .map_err(|e| ProcessError::Spawn {
            message: format!(
                "Failed to run {}: {e}",
                self.config.binary.display()
            ),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

        combined_output(output, subcommand)
    }

    async fn terminate_child(&self, mut child: TokioChild) -> Result<(), ProcessError> {
        if let Some(pid) = child.id() {
            signal_terminate(pid);
        }

        match timeout(GRACEFUL_STOP_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Server exited with {status}");
                Ok(())
            }
            Ok(Err(e)) => Err(ProcessError::Io {
                message: format!("Failed to wait for server exit: {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            }),
            Err(_) => {
                warn!("Server ignored SIGTERM for {GRACEFUL_STOP_TIMEOUT:?}, killing it");
                child.kill().await.map_err(|e| ProcessError::Io {
                    message: format!("Failed to kill server: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                    source: e,
                })
            }
        }
    }
}

fn combined_output(output: Output, subcommand: &str) -> Result<String, ProcessError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(ProcessError::Command {
            message: format!(
                "'{ADMIN_COMMAND} {subcommand}' exited with {}: {}",
                output.status,
                stderr.trim()
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    // AList logs through stderr, so the interesting lines may be on either stream.
    Ok(format!("{stdout}\n{stderr}"))
}

async fn copy_if_present(from: &Path, to: &Path) -> Result<bool, ProcessError> {
    match tokio::fs::copy(from, to).await {
        Ok(bytes) => {
            debug!("Restored {} ({bytes} bytes)", to.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProcessError::Io {
            message: format!("Failed to restore {}: {e}", from.display()),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        }),
    }
}

#[async_trait]
impl ServerProcess for SidecarServer {
    async fn init(&self) -> Result<(), ProcessError> {
        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .map_err(|e| ProcessError::Io {
                message: format!(
                    "Failed to create data directory {}: {e}",
                    self.config.data_dir.display()
                ),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })?;

        debug!("Data directory ready at {}", self.config.data_dir.display());
        Ok(())
    }

    async fn start(&self) -> Result<(), ProcessError> {
        let mut guard = self.child.lock().await;

        if let Some(child) = guard.as_mut()
            && let Ok(None) = child.try_wait()
        {
            debug!("Server already running (PID: {:?})", child.id());
            return Ok(());
        }

        let mut child = build_server_command(&self.config)
            .spawn()
            .map_err(|e| ProcessError::Spawn {
                message: format!("Failed to spawn {}: {e}", self.config.binary.display()),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(e),
            })?;

        if let Some(stdout) = child.stdout.take() {
            forward_output(stdout, "stdout", Arc::clone(&self.admin_created));
        }
        if let Some(stderr) = child.stderr.take() {
            forward_output(stderr, "stderr", Arc::clone(&self.admin_created));
        }

        info!(
            "Spawned {} {SERVER_COMMAND} (PID: {:?})",
            self.config.binary.display(),
            child.id()
        );

        *guard = Some(child);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        let owned = self.child.lock().await.take();

        if let Some(child) = owned {
            info!("Stopping owned server (PID: {:?})", child.id());
            return self.terminate_child(child).await;
        }

        let Some(pid) = server_pid(self.config.port, &self.config.binary)? else {
            debug!("Stop requested but no server is running");
            return Ok(());
        };

        info!("Stopping server adopted from a previous launch (PID: {pid})");
        let stopped = spawn_blocking(move || stop_pid(pid))
            .await
            .map_err(|e| ProcessError::Stop {
                message: format!("Stop task failed for PID {pid}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if stopped {
            Ok(())
        } else {
            Err(ProcessError::Stop {
                message: format!("Failed to stop server with PID {pid}"),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }

    async fn is_running(&self) -> Result<bool, ProcessError> {
        {
            let mut guard = self.child.lock().await;
            if let Some(child) = guard.as_mut() {
                match child.try_wait() {
                    Ok(None) => return Ok(true),
                    Ok(Some(status)) => {
                        warn!("Server exited unexpectedly with {status}");
                        *guard = None;
                    }
                    Err(e) => {
                        return Err(ProcessError::Io {
                            message: format!("Failed to query server status: {e}"),
                            location: ErrorLocation::from(Location::caller()),
                            source: e,
                        });
                    }
                }
            }
        }

        Ok(server_pid(self.config.port, &self.config.binary)?.is_some())
    }

    /// Empty only while the admin account has never been provisioned.
    ///
    /// Newer servers print a hash notice instead of the password. The value
    /// is then taken from [`PROVISIONED_PASSWORD_FILE`], or reported as
    /// [`WITHHELD_PASSWORD`] when it was set outside this app.
    async fn admin_password(&self) -> Result<String, ProcessError> {
        let output = self.run_admin(&[]).await?;

        match password_report(&output) {
            PasswordReport::Plain(password) => Ok(password),
            PasswordReport::Created => {
                info!("Admin user was just created, no password provisioned yet");
                Ok(String::new())
            }
            PasswordReport::Withheld => {
                if self.admin_created.load(Ordering::SeqCst) {
                    debug!("Admin user created by this server run, no password provisioned yet");
                    return Ok(String::new());
                }

                match self.read_provisioned().await? {
                    Some(password) => Ok(password),
                    None => {
                        debug!("Admin password is stored as a hash and was set elsewhere");
                        Ok(WITHHELD_PASSWORD.to_string())
                    }
                }
            }
        }
    }

    async fn admin_username(&self) -> Result<String, ProcessError> {
        let output = self.run_admin(&[]).await?;
        capture_value(username_regex(), &output).ok_or_else(|| ProcessError::Parse {
            message: String::from("No username found in admin info output"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    async fn set_admin_password(&self, password: &str) -> Result<(), ProcessError> {
        self.run_admin(&[ADMIN_SET_SUBCOMMAND, password]).await?;
        self.admin_created.store(false, Ordering::SeqCst);

        // The server already has the new password; without the file it is
        // only reported as withheld.
        if let Err(e) = self.write_provisioned(password).await {
            warn!("Failed to record provisioned admin password: {e}");
        }

        info!("Admin password updated");
        Ok(())
    }

    async fn admin_token(&self) -> Result<String, ProcessError> {
        let output = self.run_admin(&[ADMIN_TOKEN_SUBCOMMAND]).await?;
        capture_value(token_regex(), &output).ok_or_else(|| ProcessError::Parse {
            message: String::from("No admin token found in output"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    async fn restore(&self) -> Result<(), ProcessError> {
        let backup_dir = self
            .config
            .backup_dir
            .as_ref()
            .ok_or_else(|| ProcessError::Restore {
                message: String::from("No backup directory configured"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut restored = 0usize;
        for name in RESTORE_FILES {
            if copy_if_present(&backup_dir.join(name), &self.config.data_dir.join(name)).await? {
                restored += 1;
            }
        }

        if restored == 0 {
            return Err(ProcessError::Restore {
                message: format!("No backup found in {}", backup_dir.display()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("Restored {restored} file(s) from {}", backup_dir.display());
        Ok(())
    }
}
