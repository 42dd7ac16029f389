use server_core::DEFAULT_ADMIN_PASSWORD;
use server_core::credentials::CredentialResolver;
use server_core::process::ServerProcess;
use server_core::process::sidecar::{SidecarConfig, SidecarServer, WITHHELD_PASSWORD};

use models::ServerState;

use std::net::TcpListener;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::watch;

// ============================================================================
// Integration tests for SidecarServer against a scripted `alist` binary
// ============================================================================

const HASHED_INFO: &str = "\
INFO[2024-05-20 10:00:00] reading config file: data/config.json
INFO[2024-05-20 10:00:00] Admin user's username: admin
INFO[2024-05-20 10:00:00] The password can only be output at the first startup, and then stored as a hash value, which cannot be reversed
INFO[2024-05-20 10:00:00] You can also set a new password by running [alist admin set NEW_PASSWORD]
";

const CREATED_INFO: &str = "\
INFO[2024-05-20 10:00:00] reading config file: data/config.json
INFO[2024-05-20 10:00:00] Successfully created the admin user and the initial password is: 7fGh2kLq
INFO[2024-05-20 10:00:00] Admin user's username: admin
INFO[2024-05-20 10:00:00] The password can only be output at the first startup, and then stored as a hash value, which cannot be reversed
";

#[cfg(unix)]
struct ScriptedAlist {
    dir: TempDir,
    server: Arc<SidecarServer>,
}

#[cfg(unix)]
impl ScriptedAlist {
    /// An `alist` stand-in: `admin` prints `info.txt`, `admin set` is recorded
    /// in `calls.log`, and `server` prints `server_output` then idles.
    fn new(server_output: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let bin_dir = dir.path().join("bin");
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&bin_dir).expect("bin dir");
        std::fs::create_dir_all(&data_dir).expect("data dir");

        let info = dir.path().join("info.txt");
        let calls = dir.path().join("calls.log");
        let script = format!(
            r#"#!/bin/sh
case "$1" in
  server)
    printf '%s\n' "{server_output}" >&2
    exec sleep 30
    ;;
  admin)
    case "$2" in
      set)
        echo "set $3" >> "{calls}"
        echo "INFO[2024-05-20 10:00:00] admin user has been updated:" >&2
        ;;
      token)
        echo "INFO[2024-05-20 10:00:00] Admin token: alist-token-1" >&2
        ;;
      *)
        cat "{info}" >&2
        ;;
    esac
    ;;
esac
"#,
            calls = calls.display(),
            info = info.display(),
        );

        let binary = bin_dir.join("alist");
        std::fs::write(&binary, script).expect("write script");
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");

        let config = SidecarConfig {
            binary,
            ..SidecarConfig::new(data_dir)
        };

        let scripted = Self {
            dir,
            server: Arc::new(SidecarServer::new(config)),
        };
        scripted.set_info(HASHED_INFO);
        scripted
    }

    fn set_info(&self, info: &str) {
        std::fs::write(self.dir.path().join("info.txt"), info).expect("write info");
    }

    fn set_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn resolver(&self) -> CredentialResolver {
        let (_tx, rx) = watch::channel(ServerState::Running);
        CredentialResolver::new(
            Arc::clone(&self.server) as Arc<dyn ServerProcess>,
            rx,
            DEFAULT_ADMIN_PASSWORD,
        )
    }
}

/// **VALUE**: Verifies a hash-only server that this app never provisioned is left alone.
///
/// **WHY THIS MATTERS**: Current servers never print the password. Reading that as "never
/// set" resets the user's password to the default on every focus, on a server that exposes
/// WebDAV to the LAN.
///
/// **BUG THIS CATCHES**: Would catch `admin_password()` returning an empty string for the
/// hash notice.
#[cfg(unix)]
#[tokio::test]
async fn given_hashed_password_set_elsewhere_when_resolved_then_withheld_and_not_reset() {
    // GIVEN: A server reporting only the hash notice, nothing provisioned by the app
    let alist = ScriptedAlist::new("INFO started");

    // WHEN
    let credentials = alist.resolver().resolve().await.expect("credentials");

    // THEN
    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password.as_str(), WITHHELD_PASSWORD);
    assert!(alist.set_calls().is_empty(), "password was reset");
}

/// **VALUE**: Verifies the default password is provisioned once and then read back.
///
/// **WHY THIS MATTERS**: After provisioning the server only reports a hash; the status
/// screen must keep showing the real password without setting it again.
///
/// **BUG THIS CATCHES**: Would catch provisioning on every resolution, or the provisioned
/// password not being recorded.
#[cfg(unix)]
#[tokio::test]
async fn given_fresh_server_when_resolved_twice_then_default_provisioned_once() {
    // GIVEN: The first admin call creates the admin user
    let alist = ScriptedAlist::new("INFO started");
    alist.set_info(CREATED_INFO);
    let resolver = alist.resolver();

    // WHEN: First resolution, then the server reports the hash notice from now on
    let first = resolver.resolve().await.expect("first resolve");
    alist.set_info(HASHED_INFO);
    let second = resolver.resolve().await.expect("second resolve");

    // THEN
    assert_eq!(first.password.as_str(), DEFAULT_ADMIN_PASSWORD);
    assert_eq!(second.password.as_str(), DEFAULT_ADMIN_PASSWORD);
    assert_eq!(alist.set_calls(), vec![format!("set {DEFAULT_ADMIN_PASSWORD}")]);
}

/// **VALUE**: Verifies a password set through the app is what later reads return.
#[cfg(unix)]
#[tokio::test]
async fn given_password_set_by_app_when_read_then_returns_it() {
    // GIVEN
    let alist = ScriptedAlist::new("INFO started");

    // WHEN
    alist
        .server
        .set_admin_password("n3w-Pa55")
        .await
        .expect("set password");
    let password = alist.server.admin_password().await.expect("password");

    // THEN
    assert_eq!(password, "n3w-Pa55");
    assert_eq!(alist.set_calls(), vec!["set n3w-Pa55".to_string()]);
}

/// **VALUE**: Verifies an admin user created by the server's first run gets provisioned.
///
/// **WHY THIS MATTERS**: On a fresh data directory the server itself creates the admin with
/// a random password that is printed once. Without provisioning the user cannot log in.
///
/// **BUG THIS CATCHES**: Would catch the server output no longer being watched for the
/// creation notice, which leaves the password reported as withheld forever.
#[cfg(unix)]
#[tokio::test]
async fn given_server_run_created_admin_when_read_then_empty_until_provisioned() {
    // GIVEN: A first server run that creates the admin user
    let alist = ScriptedAlist::new(
        "INFO[2024-05-20 10:00:00] Successfully created the admin user and the initial password is: 7fGh2kLq",
    );
    alist.server.start().await.expect("start");

    // WHEN: Waiting until the creation notice has been seen
    let mut password = alist.server.admin_password().await.expect("password");
    for _ in 0..40 {
        if password.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        password = alist.server.admin_password().await.expect("password");
    }

    // THEN: Reported as never set, then as provisioned
    assert_eq!(password, "");
    alist
        .server
        .set_admin_password(DEFAULT_ADMIN_PASSWORD)
        .await
        .expect("provision");
    assert_eq!(
        alist.server.admin_password().await.expect("password"),
        DEFAULT_ADMIN_PASSWORD
    );

    alist.server.stop().await.expect("stop");
}

/// **VALUE**: Verifies an unrelated program on the server port is neither adopted nor stopped.
///
/// **WHY THIS MATTERS**: `stop()` terminates the adopted PID. Here the listener is the test
/// process itself; adopting it would kill the test run.
///
/// **BUG THIS CATCHES**: Would catch port ownership alone being taken as "server running".
#[tokio::test]
async fn given_foreign_listener_on_port_when_queried_then_not_running_and_stop_is_noop() {
    // GIVEN: Something other than AList holds the port
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let dir = TempDir::new().expect("temp dir");
    let server = SidecarServer::new(SidecarConfig {
        port,
        ..SidecarConfig::new(dir.path())
    });

    // WHEN
    let running = server.is_running().await.expect("is_running");
    let stopped = server.stop().await;

    // THEN: Not adopted, nothing signalled, the listener is still ours
    assert!(!running);
    assert!(stopped.is_ok());
    assert_eq!(listener.local_addr().expect("addr").port(), port);
}
