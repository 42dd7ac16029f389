//! OS-level process queries: who listens on the server port, and stopping a PID.

use crate::error::process::ProcessError;

use common::ErrorLocation;

use std::ffi::OsStr;
use std::panic::Location;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, trace, warn};
use netstat2::{
    AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, SocketInfo, TcpState, get_sockets_info,
};
use sysinfo::{Pid, Process, ProcessesToUpdate, Signal, System};

const KILL_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(5);
const SERVER_SUBCOMMAND: &str = "server";

#[track_caller]
fn query_tcp_sockets() -> Result<Vec<SocketInfo>, ProcessError> {
    get_sockets_info(
        AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
        ProtocolFlags::TCP,
    )
    .map_err(|e| ProcessError::SystemQuery {
        message: format!("Failed to query network sockets: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })
}

/// PID of the process listening on `port`, if any.
#[track_caller]
pub fn listening_pid(port: u16) -> Result<Option<u32>, ProcessError> {
    let sockets = query_tcp_sockets()?;

    for s in sockets {
        if let ProtocolSocketInfo::Tcp(tcp) = s.protocol_socket_info
            && tcp.state == TcpState::Listen
            && tcp.local_port == port
            && let Some(&pid) = s.associated_pids.first()
        {
            let name = with_process(pid, |p| p.name().to_string_lossy().to_string());
            trace!("Port {port} is held by PID {pid} ({name:?})");
            return Ok(Some(pid));
        }
    }

    debug!("No process listening on port {port}");
    Ok(None)
}

/// PID of the AList server listening on `port`, if any.
///
/// A listener that is not `binary` running the `server` subcommand belongs to
/// someone else and is never reported.
#[track_caller]
pub fn server_pid(port: u16, binary: &Path) -> Result<Option<u32>, ProcessError> {
    let Some(pid) = listening_pid(port)? else {
        return Ok(None);
    };

    let identity = with_process(pid, |p| {
        let args: Vec<String> = p
            .cmd()
            .iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect();
        (p.name().to_os_string(), p.exe().map(Path::to_path_buf), args)
    });

    let Some((name, exe, args)) = identity else {
        trace!("Process {pid} disappeared before we could read its info");
        return Ok(None);
    };

    if is_server_process(&name, exe.as_deref(), &args, binary) {
        debug!("Port {port} is held by the server (PID: {pid})");
        Ok(Some(pid))
    } else {
        warn!(
            "Port {port} is held by an unrelated process {name:?} (PID: {pid}): {}",
            args.join(" ")
        );
        Ok(None)
    }
}

/// Whether a process looks like `binary server ...`.
///
/// The name or executable must match the binary's file stem (so `alist.exe`
/// counts as `alist`), and one of the
/// arguments after the program must be the `server` subcommand.
pub(crate) fn is_server_process(
    name: &OsStr,
    exe: Option<&Path>,
    args: &[String],
    binary: &Path,
) -> bool {
    let Some(expected) = binary.file_stem() else {
        return false;
    };

    let name_matches =
        Path::new(name).file_stem() == Some(expected) || exe.and_then(Path::file_stem) == Some(expected);
    let runs_server = args.iter().skip(1).any(|arg| arg == SERVER_SUBCOMMAND);

    name_matches && runs_server
}

pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);

    sys.process(Pid::from_u32(pid)).map(f)
}

/// Ask `pid` to terminate (SIGTERM, falling back to SIGKILL).
///
/// Returns whether the signal was delivered. PIDs 0 and 1 are never signalled.
pub fn signal_terminate(pid: u32) -> bool {
    if pid <= 1 {
        warn!("Refusing to signal PID {pid}");
        return false;
    }

    with_process(pid, |p| {
        if let Some(sent) = p.kill_with(Signal::Term) {
            debug!("Sent SIGTERM to PID {pid}: success={sent}");
            sent
        } else {
            let killed = p.kill();
            debug!("Sent SIGKILL to PID {pid}: success={killed}");
            killed
        }
    })
    .unwrap_or_else(|| {
        debug!("Process {pid} not found");
        false
    })
}

/// Stop a process we do not own and wait until it is gone.
///
/// Blocks while verifying termination with exponential backoff for up to
/// five seconds; call it from `spawn_blocking` in async code.
pub fn stop_pid(pid: u32) -> bool {
    if !signal_terminate(pid) {
        return false;
    }

    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(KILL_VERIFY_MAX_ELAPSED),
        ..Default::default()
    };

    loop {
        if with_process(pid, |_| true).is_none() {
            debug!("Process {pid} terminated");
            return true;
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Process {pid} still alive, retrying after {duration:?}");
                sleep(duration);
            }
            None => {
                debug!("Process {pid} still running after {KILL_VERIFY_MAX_ELAPSED:?}");
                return false;
            }
        }
    }
}
