// Unit tests for the sidecar's private helpers: admin output parsing and
// command construction.

use crate::SERVER_PORT;
use crate::process::sidecar::{
    PasswordReport, SidecarConfig, build_admin_command, build_server_command, capture_value,
    password_regex, password_report, token_regex, username_regex,
};

use std::ffi::OsStr;
use std::path::PathBuf;

const ADMIN_OUTPUT: &str = "\
INFO[2024-03-01 10:00:00] reading config file: /data/config.json
INFO[2024-03-01 10:00:00] admin user's info:
username: admin
password: s3cr3t-Pa55";

/// `alist admin` on 3.25 and later: the password is only ever stored as a hash.
const HASHED_ADMIN_OUTPUT: &str = "\
INFO[2024-05-20 10:00:00] reading config file: /data/config.json
INFO[2024-05-20 10:00:00] load config from env with prefix: ALIST_
INFO[2024-05-20 10:00:00] init logrus...
INFO[2024-05-20 10:00:00] Admin user's username: admin
INFO[2024-05-20 10:00:00] The password can only be output at the first startup, and then stored as a hash value, which cannot be reversed
INFO[2024-05-20 10:00:00] You can reset the password with a random string by running [alist admin random]
INFO[2024-05-20 10:00:00] You can also set a new password by running [alist admin set NEW_PASSWORD]";

/// **VALUE**: Verifies the username and password are read from the admin command's output.
///
/// **WHY THIS MATTERS**: These values are shown to the user to log into the web UI and WebDAV.
///
/// **BUG THIS CATCHES**: Would catch patterns that grab the log prefix or stop at the wrong
/// character.
#[test]
fn given_admin_output_when_captured_then_returns_username_and_password() {
    // GIVEN: Output of `alist admin`

    // WHEN: Capturing both values
    let username = capture_value(username_regex(), ADMIN_OUTPUT);
    let password = capture_value(password_regex(), ADMIN_OUTPUT);

    // THEN
    assert_eq!(username.as_deref(), Some("admin"));
    assert_eq!(password.as_deref(), Some("s3cr3t-Pa55"));
}

/// **VALUE**: Verifies an unset password is reported as empty, not missing.
///
/// **WHY THIS MATTERS**: An empty password is the first-boot signal that triggers provisioning
/// of the default password.
///
/// **BUG THIS CATCHES**: Would catch a pattern that swallows the next line as the password.
#[test]
fn given_empty_password_line_when_captured_then_returns_empty_string() {
    // GIVEN: A password line with no value, followed by another line
    let output = "username: admin\npassword: \nINFO done";

    // WHEN
    let password = capture_value(password_regex(), output);

    // THEN
    assert_eq!(password.as_deref(), Some(""));
}

/// **VALUE**: Verifies the admin token is captured regardless of case and log prefix.
///
/// **WHY THIS MATTERS**: The token is what signs the embedded browser into the web UI.
///
/// **BUG THIS CATCHES**: Would catch a case-sensitive pattern missing "Admin token:".
#[test]
fn given_token_output_when_captured_then_returns_token() {
    // GIVEN
    let output = "INFO[2024-03-01 10:00:00] Admin token: alist-abc.DEF_123";

    // WHEN
    let token = capture_value(token_regex(), output);

    // THEN
    assert_eq!(token.as_deref(), Some("alist-abc.DEF_123"));
}

/// **VALUE**: Verifies unrelated output yields no capture.
///
/// **BUG THIS CATCHES**: Would catch patterns loose enough to match arbitrary log lines.
#[test]
fn given_unrelated_output_when_captured_then_returns_none() {
    let output = "FATA[0000] failed to open database";

    assert_eq!(capture_value(username_regex(), output), None);
    assert_eq!(capture_value(token_regex(), output), None);
}

/// **VALUE**: Verifies the server is launched as `<binary> server --data <dir>`.
///
/// **WHY THIS MATTERS**: Without `--data` the server writes its database next to the binary,
/// which is read-only inside an app bundle.
///
/// **BUG THIS CATCHES**: Would catch argument order changes or a missing data dir.
#[test]
fn given_config_when_server_command_built_then_passes_data_dir() {
    // GIVEN
    let config = SidecarConfig::new("/tmp/alist-data");

    // WHEN
    let cmd = build_server_command(&config);
    let std_cmd = cmd.as_std();

    // THEN
    assert_eq!(std_cmd.get_program(), OsStr::new("alist"));
    let args: Vec<&OsStr> = std_cmd.get_args().collect();
    assert_eq!(
        args,
        vec![
            OsStr::new("server"),
            OsStr::new("--data"),
            OsStr::new("/tmp/alist-data")
        ]
    );
}

/// **VALUE**: Verifies admin subcommands place their arguments before `--data`.
///
/// **BUG THIS CATCHES**: Would catch `admin --data DIR set PWD`, which the CLI rejects.
#[test]
fn given_set_args_when_admin_command_built_then_orders_arguments() {
    // GIVEN
    let config = SidecarConfig {
        binary: PathBuf::from("/opt/alist/alist"),
        ..SidecarConfig::new("/data")
    };

    // WHEN
    let cmd = build_admin_command(&config, &["set", "admin"]);
    let args: Vec<&OsStr> = cmd.as_std().get_args().collect();

    // THEN
    assert_eq!(cmd.as_std().get_program(), OsStr::new("/opt/alist/alist"));
    assert_eq!(
        args,
        vec![
            OsStr::new("admin"),
            OsStr::new("set"),
            OsStr::new("admin"),
            OsStr::new("--data"),
            OsStr::new("/data")
        ]
    );
}

#[test]
fn given_new_config_when_created_then_uses_default_port_and_no_backup() {
    let config = SidecarConfig::new("/data");

    assert_eq!(config.port, SERVER_PORT);
    assert!(config.backup_dir.is_none());
    assert!(!config.command_timeout.is_zero());
}

/// **VALUE**: Verifies a hash-only server is reported as withheld, not as "never set".
///
/// **WHY THIS MATTERS**: An empty password triggers provisioning of the default. Reading the
/// hash notice as empty would reset the user's password to the default on every focus, on a
/// server that exposes WebDAV to the LAN.
///
/// **BUG THIS CATCHES**: Would catch classification falling back to an empty password when
/// no `password:` line is printed.
#[test]
fn given_hashed_admin_output_when_classified_then_withheld() {
    // GIVEN: Output of `alist admin` on a current server

    // WHEN
    let report = password_report(HASHED_ADMIN_OUTPUT);

    // THEN
    assert_eq!(report, PasswordReport::Withheld);
    assert_eq!(
        capture_value(username_regex(), HASHED_ADMIN_OUTPUT).as_deref(),
        Some("admin")
    );
}

/// **VALUE**: Verifies older servers that print the password keep working.
///
/// **BUG THIS CATCHES**: Would catch the new classification hiding a printed password, or
/// turning an empty one into something other than "never set".
#[test]
fn given_plain_admin_output_when_classified_then_plain() {
    assert_eq!(
        password_report(ADMIN_OUTPUT),
        PasswordReport::Plain("s3cr3t-Pa55".to_string())
    );
    assert_eq!(
        password_report("username: admin\npassword: \nINFO done"),
        PasswordReport::Plain(String::new())
    );
}

/// **VALUE**: Verifies the first-run announcement is read as a freshly created admin user.
///
/// **WHY THIS MATTERS**: That is the one moment the default password should be provisioned.
///
/// **BUG THIS CATCHES**: Would catch the random initial password being taken as the user's.
#[test]
fn given_initial_password_announcement_when_classified_then_created() {
    // GIVEN
    let output = "\
INFO[2024-05-20 10:00:00] reading config file: /data/config.json
INFO[2024-05-20 10:00:00] Successfully created the admin user and the initial password is: 7fGh2kLq
INFO[2024-05-20 10:00:00] Admin user's username: admin
INFO[2024-05-20 10:00:00] The password can only be output at the first startup, and then stored as a hash value, which cannot be reversed";

    // WHEN / THEN
    assert_eq!(password_report(output), PasswordReport::Created);
}
