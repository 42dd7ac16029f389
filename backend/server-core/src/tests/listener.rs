// Unit tests for OS process queries

use crate::process::listener::{is_server_process, server_pid, signal_terminate, with_process};

use std::ffi::OsStr;
use std::net::TcpListener;
use std::path::Path;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// **VALUE**: Verifies init and the kernel scheduler are never signalled.
///
/// **WHY THIS MATTERS**: A bogus PID from a socket table (0 for kernel-owned sockets) must
/// not turn into `kill(0)`, which signals the whole process group.
///
/// **BUG THIS CATCHES**: Would catch removing the PID guard in `signal_terminate()`.
#[test]
fn given_reserved_pid_when_signal_terminate_called_then_refuses() {
    assert!(!signal_terminate(0));
    assert!(!signal_terminate(1));
}

/// **VALUE**: Verifies `with_process()` tolerates PIDs that do not exist.
///
/// **WHY THIS MATTERS**: The listener can exit between the socket scan and the lookup.
///
/// **BUG THIS CATCHES**: Would catch panics on vanished processes.
#[test]
fn given_nonexistent_pid_when_with_process_called_then_returns_none() {
    // GIVEN
    let fake_pid = u32::MAX;

    // WHEN
    let result = with_process(fake_pid, |_| true);

    // THEN
    assert!(result.is_none());
}

#[test]
fn given_own_pid_when_with_process_called_then_executes_closure() {
    // GIVEN
    let our_pid = std::process::id();

    // WHEN
    let result = with_process(our_pid, |p| p.pid().as_u32());

    // THEN
    assert_eq!(result, Some(our_pid));
}

#[test]
fn given_nonexistent_pid_when_signal_terminate_called_then_returns_false() {
    assert!(!signal_terminate(u32::MAX));
}

/// **VALUE**: Verifies only `alist server` counts as the server.
///
/// **WHY THIS MATTERS**: Whatever holds the port is adopted as the server and later gets
/// SIGTERM from `stop()`.
///
/// **BUG THIS CATCHES**: Would catch a filter that checks only the name, or only the command.
#[test]
fn given_process_identity_when_checked_then_only_server_subcommand_of_binary_matches() {
    let binary = Path::new("/app/bin/alist");

    // Name matches, runs `server`
    assert!(is_server_process(
        OsStr::new("alist"),
        None,
        &args(&["alist", "server", "--data", "/d"]),
        binary
    ));

    // Name truncated or renamed, executable still matches
    assert!(is_server_process(
        OsStr::new("alist-arm64"),
        Some(Path::new("/app/bin/alist")),
        &args(&["/app/bin/alist", "server"]),
        binary
    ));

    // Windows executable name
    assert!(is_server_process(
        OsStr::new("alist.exe"),
        None,
        &args(&["alist.exe", "server"]),
        Path::new("alist")
    ));

    // Right binary, wrong subcommand
    assert!(!is_server_process(
        OsStr::new("alist"),
        None,
        &args(&["alist", "admin", "--data", "/d"]),
        binary
    ));

    // "server" only inside the program path
    assert!(!is_server_process(
        OsStr::new("alist"),
        None,
        &args(&["/opt/server/alist"]),
        binary
    ));

    // Unrelated program running a `server` subcommand
    assert!(!is_server_process(
        OsStr::new("python3"),
        Some(Path::new("/usr/bin/python3")),
        &args(&["python3", "-m", "http", "server"]),
        binary
    ));
}

/// **VALUE**: Verifies a foreign listener on the server port is not adopted.
///
/// **WHY THIS MATTERS**: An adopted PID is what `stop()` signals. Adopting an unrelated
/// listener means terminating someone else's program, here the test process itself.
///
/// **BUG THIS CATCHES**: Would catch `server_pid()` returning any PID bound to the port.
#[test]
fn given_foreign_listener_when_server_pid_queried_then_not_adopted() {
    // GIVEN: This process listens on a port
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    // WHEN
    let pid = server_pid(port, Path::new("alist")).expect("socket query");

    // THEN
    assert_eq!(pid, None);
}
