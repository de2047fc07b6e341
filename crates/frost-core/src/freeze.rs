//! Freeze scheduler
//!
//! Pins addresses to values by rewriting them from a single background
//! thread. The thread starts lazily on the first freeze, takes the entry
//! lock once per pass, and is flagged down and joined by `clear_freezes`,
//! so after `clear_freezes` returns no further write can reach the target.

use crate::backend::MemoryAccess;
use frost_common::FreezeEntry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Delay between rewrite passes. Short enough that a frozen value is never
/// observably stale, long enough to keep the target's page tables cool.
pub const FREEZE_INTERVAL: Duration = Duration::from_millis(30);

/// State shared with the worker thread.
struct FreezeShared {
    entries: Mutex<Vec<FreezeEntry>>,
    /// Handle writes go through. Replaced when the scanner rebinds.
    access: Mutex<Option<Arc<dyn MemoryAccess>>>,
    /// Worker keeps running while this holds.
    requested: AtomicBool,
}

/// Owner of the freeze entry set and its worker thread.
pub struct FreezeScheduler {
    shared: Arc<FreezeShared>,
    worker: Option<JoinHandle<()>>,
}

impl FreezeScheduler {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(FreezeShared {
                entries: Mutex::new(Vec::new()),
                access: Mutex::new(None),
                requested: AtomicBool::new(false),
            }),
            worker: None,
        }
    }

    /// Pin `value` at `address`, starting the worker if it is not running.
    ///
    /// Freezing an already frozen address replaces its value in place; there
    /// is never more than one entry per address.
    pub fn freeze_value(&mut self, access: Arc<dyn MemoryAccess>, address: usize, value: &[u8]) {
        {
            let mut entries = lock_entries(&self.shared.entries);
            match entries.iter_mut().find(|e| e.address == address) {
                Some(entry) => {
                    entry.value = value.to_vec();
                    entry.active = true;
                }
                None => entries.push(FreezeEntry {
                    address,
                    value: value.to_vec(),
                    active: true,
                }),
            }
        }

        if let Ok(mut slot) = self.shared.access.lock() {
            *slot = Some(access);
        }

        debug!(address = format!("{:#x}", address), "Freeze entry set");
        self.ensure_worker();
    }

    fn ensure_worker(&mut self) {
        if self.worker.is_some() {
            return;
        }

        self.shared.requested.store(true, Ordering::SeqCst);
        let shared = self.shared.clone();
        match std::thread::Builder::new()
            .name("frost-freeze".to_string())
            .spawn(move || freeze_loop(&shared))
        {
            Ok(handle) => self.worker = Some(handle),
            Err(e) => {
                self.shared.requested.store(false, Ordering::SeqCst);
                error!(error = %e, "Failed to spawn freeze worker");
            }
        }
    }

    /// Remove every entry and stop the worker, blocking until it has
    /// finished its current pass.
    pub fn clear_freezes(&mut self) {
        lock_entries(&self.shared.entries).clear();
        self.shared.requested.store(false, Ordering::SeqCst);

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Freeze worker panicked before shutdown");
            }
        }

        if let Ok(mut slot) = self.shared.access.lock() {
            *slot = None;
        }
    }

    /// Number of entries currently being rewritten.
    pub fn active_count(&self) -> usize {
        lock_entries(&self.shared.entries)
            .iter()
            .filter(|e| e.active)
            .count()
    }
}

impl Default for FreezeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FreezeScheduler {
    fn drop(&mut self) {
        self.clear_freezes();
    }
}

fn lock_entries(entries: &Mutex<Vec<FreezeEntry>>) -> std::sync::MutexGuard<'_, Vec<FreezeEntry>> {
    entries.lock().unwrap_or_else(|poisoned| {
        warn!("Freeze entry lock poisoned, recovering");
        poisoned.into_inner()
    })
}

fn freeze_loop(shared: &FreezeShared) {
    info!("Freeze worker started");

    while shared.requested.load(Ordering::SeqCst) {
        let access = shared
            .access
            .lock()
            .ok()
            .and_then(|slot| slot.clone());

        if let Some(access) = access {
            // One lock acquisition per pass.
            let entries = lock_entries(&shared.entries).clone();
            run_freeze_pass(access.as_ref(), &entries);
        }

        std::thread::sleep(FREEZE_INTERVAL);
    }

    info!("Freeze worker stopped");
}

/// Rewrite every active entry once. A failed write logs and moves on so a
/// single stale address cannot stall the rest of the set.
pub fn run_freeze_pass(access: &dyn MemoryAccess, entries: &[FreezeEntry]) {
    for entry in entries.iter().filter(|e| e.active) {
        if let Err(e) = access.write(entry.address, &entry.value) {
            warn!(
                address = format!("{:#x}", entry.address),
                error = %e,
                "Freeze write failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockProcess;

    #[test]
    fn test_freeze_upserts_per_address() {
        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 8]);

        let mut scheduler = FreezeScheduler::new();
        scheduler.freeze_value(process.clone(), 0x1000, &1i32.to_le_bytes());
        scheduler.freeze_value(process.clone(), 0x1004, &2i32.to_le_bytes());
        scheduler.freeze_value(process.clone(), 0x1000, &9i32.to_le_bytes());

        assert_eq!(scheduler.active_count(), 2);

        // Latest value for the re-frozen address wins.
        let entries = lock_entries(&scheduler.shared.entries).clone();
        run_freeze_pass(process.as_ref(), &entries);
        assert_eq!(process.peek_i32(0x1000), Some(9));
        assert_eq!(process.peek_i32(0x1004), Some(2));
    }

    #[test]
    fn test_pass_survives_failing_write() {
        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 4]);

        let entries = vec![
            FreezeEntry {
                address: 0x9999, // unmapped
                value: 5i32.to_le_bytes().to_vec(),
                active: true,
            },
            FreezeEntry {
                address: 0x1000,
                value: 7i32.to_le_bytes().to_vec(),
                active: true,
            },
        ];

        run_freeze_pass(process.as_ref(), &entries);
        assert_eq!(process.peek_i32(0x1000), Some(7));
    }

    #[test]
    fn test_pass_skips_inactive_entries() {
        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 4]);

        let entries = vec![FreezeEntry {
            address: 0x1000,
            value: 3i32.to_le_bytes().to_vec(),
            active: false,
        }];

        run_freeze_pass(process.as_ref(), &entries);
        assert_eq!(process.peek_i32(0x1000), Some(0));
    }

    #[test]
    fn test_worker_rewrites_external_changes() {
        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 4]);

        let mut scheduler = FreezeScheduler::new();
        scheduler.freeze_value(process.clone(), 0x1000, &42i32.to_le_bytes());

        // Simulate the target overwriting the value between passes.
        process.poke(0x1000, &1i32.to_le_bytes());
        std::thread::sleep(FREEZE_INTERVAL * 3);
        assert_eq!(process.peek_i32(0x1000), Some(42));

        scheduler.clear_freezes();
        assert_eq!(scheduler.active_count(), 0);

        // After clearing, the worker is gone and writes stick.
        process.poke(0x1000, &5i32.to_le_bytes());
        std::thread::sleep(FREEZE_INTERVAL * 3);
        assert_eq!(process.peek_i32(0x1000), Some(5));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut scheduler = FreezeScheduler::new();
        scheduler.clear_freezes();
        scheduler.clear_freezes();
        assert_eq!(scheduler.active_count(), 0);

        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 4]);
        scheduler.freeze_value(process, 0x1000, &1i32.to_le_bytes());
        scheduler.clear_freezes();
        scheduler.clear_freezes();
        assert_eq!(scheduler.active_count(), 0);
    }
}
