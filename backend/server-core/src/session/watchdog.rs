//! Detects an embedded browser whose content process is gone.
//!
//! A terminated web content process leaves a blank view that still accepts
//! scripts without running them. The watchdog sends a numbered heartbeat
//! script; a page that is alive answers through the `browser_heartbeat`
//! command, and an unanswered heartbeat means the page has to be reloaded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Command the page calls to answer a heartbeat.
pub const HEARTBEAT_COMMAND: &str = "browser_heartbeat";

/// Outcome of a heartbeat round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserHealth {
    /// No live browser to check.
    Absent,
    Alive,
    /// No answer; the page was reloaded.
    Recovered,
    /// No answer and the reload failed; the browser was detached.
    Lost,
}

#[derive(Default)]
pub struct ContentWatchdog {
    next: AtomicU64,
    pending: Mutex<Option<u64>>,
}

impl ContentWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new round and returns its sequence number. Replaces any round
    /// still waiting.
    pub fn arm(&self) -> u64 {
        let seq = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(seq);
        seq
    }

    /// Records the page's answer. Answers to older rounds are ignored.
    pub fn acknowledge(&self, seq: u64) -> bool {
        self.settle(seq)
    }

    /// True if round `seq` was still waiting, which ends it.
    pub fn expire(&self, seq: u64) -> bool {
        self.settle(seq)
    }

    fn settle(&self, seq: u64) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if *pending == Some(seq) {
            *pending = None;
            true
        } else {
            false
        }
    }
}

/// Script asking the page to answer round `seq` with its current location.
pub fn heartbeat_script(seq: u64) -> String {
    format!(
        "(function () {{\n  var tauri = window.__TAURI_INTERNALS__;\n  if (tauri) {{\n    tauri.invoke(\"{HEARTBEAT_COMMAND}\", {{ seq: {seq}, url: window.location.href }});\n  }}\n}})();\ntrue;"
    )
}
