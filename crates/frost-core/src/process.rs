//! Process attachment gate
//!
//! Resolves process ids to open memory handles, enforces the attach
//! denylist, and owns handle lifetime. At most one session is open per
//! manager; attaching again releases the previous handle first. Policy is
//! checked here only; once attached, memory access trusts the handle.

use crate::backend::{MemoryAccess, ProcessApi};
use frost_common::{is_blocked_process, Error, ProcessEntry, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The one open session: handle plus resolved display name.
struct AttachedProcess {
    pid: u32,
    name: String,
    access: Arc<dyn MemoryAccess>,
}

/// Gate between callers and OS process handles.
pub struct ProcessManager {
    api: Box<dyn ProcessApi>,
    session: Option<AttachedProcess>,
}

impl ProcessManager {
    pub fn new(api: Box<dyn ProcessApi>) -> Self {
        Self { api, session: None }
    }

    /// Manager over the native OS backend.
    pub fn native() -> Self {
        Self::new(Box::new(crate::backend::NativeApi::new()))
    }

    /// List running processes, annotated with the denylist flag and sorted
    /// by case-insensitive name for stable display.
    ///
    /// Enumeration failure is not fatal to the caller: it yields an empty
    /// list and a log line.
    pub fn enumerate(&self) -> Vec<ProcessEntry> {
        let raw = match self.api.enumerate() {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Failed to enumerate processes");
                return Vec::new();
            }
        };

        let mut processes: Vec<ProcessEntry> = raw
            .into_iter()
            .map(|(pid, name)| {
                let blocked = is_blocked_process(&name);
                ProcessEntry { pid, name, blocked }
            })
            .collect();

        processes.sort_by_key(|entry| entry.name.to_lowercase());
        processes
    }

    /// Open a session for `pid`.
    ///
    /// Any previously held handle is released first, so a failed attach
    /// always leaves the manager detached. Denylisted targets are refused
    /// after name resolution and before the session is stored.
    pub fn attach(&mut self, pid: u32) -> Result<()> {
        self.detach();

        let (name, access) = self.api.open(pid).map_err(|e| {
            error!(pid, error = %e, "Unable to open target process handle");
            e
        })?;

        if is_blocked_process(&name) {
            warn!(process = %name, "Refused to attach to blocked process");
            return Err(Error::PolicyDenied(name));
        }

        info!(pid, process = %name, "Attached to process");
        self.session = Some(AttachedProcess { pid, name, access });
        Ok(())
    }

    /// Release the held handle, if any. Safe to call when detached.
    pub fn detach(&mut self) {
        if let Some(session) = self.session.take() {
            info!(process = %session.name, "Detached from process");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_pid(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.pid)
    }

    pub fn current_process_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.name.as_str())
    }

    /// Handle for the scanner to bind. `None` when detached.
    pub fn access(&self) -> Option<Arc<dyn MemoryAccess>> {
        self.session.as_ref().map(|s| s.access.clone())
    }
}

impl Drop for ProcessManager {
    fn drop(&mut self) {
        self.detach();
    }
}
