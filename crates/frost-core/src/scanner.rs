//! Snapshot scanner
//!
//! The "shoot once, compare" workflow: capture a region, let the operator
//! perform an action known to change a value by a known amount, capture
//! again, and diff the two captures in fixed 4-byte strides. Every offset
//! consistent with the expected delta becomes a candidate address, which
//! exact-value filtering then narrows toward a single hit worth freezing.
//!
//! Snapshots and candidate lists live entirely on the caller's thread; only
//! the freeze entry set crosses into the background scheduler.

use crate::backend::MemoryAccess;
use crate::freeze::FreezeScheduler;
use frost_common::{Error, MemorySnapshot, Result};
use std::sync::Arc;
use tracing::{debug, trace};

/// Scan width: values are compared as native signed 32-bit integers.
const VALUE_SIZE: usize = std::mem::size_of::<i32>();

/// Scanner bound to at most one process handle.
pub struct MemoryScanner {
    access: Option<Arc<dyn MemoryAccess>>,
    freezes: FreezeScheduler,
}

impl MemoryScanner {
    pub fn new() -> Self {
        Self {
            access: None,
            freezes: FreezeScheduler::new(),
        }
    }

    /// Bind the handle used by all subsequent reads, writes and freezes.
    ///
    /// Binding does not touch existing freeze entries; callers switching
    /// targets must `clear_freezes` first so no write lands on the old one.
    pub fn bind(&mut self, access: Arc<dyn MemoryAccess>) {
        self.access = Some(access);
    }

    /// Drop the bound handle. Subsequent operations fail cleanly.
    pub fn unbind(&mut self) {
        self.access = None;
    }

    pub fn is_bound(&self) -> bool {
        self.access.is_some()
    }

    fn access(&self) -> Result<&Arc<dyn MemoryAccess>> {
        self.access.as_ref().ok_or(Error::HandleUnavailable)
    }

    /// Read exactly one i32. A short read is a `PartialTransfer`.
    pub fn read_i32(&self, address: usize) -> Result<i32> {
        let bytes = self.access()?.read(address, VALUE_SIZE)?;
        if bytes.len() != VALUE_SIZE {
            return Err(Error::PartialTransfer {
                address,
                expected: VALUE_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(i32_at(&bytes, 0))
    }

    /// Write exactly one i32.
    pub fn write_i32(&self, address: usize, value: i32) -> Result<()> {
        self.access()?.write(address, &value.to_le_bytes())
    }

    /// Capture up to `size` bytes at `base` into an immutable snapshot.
    ///
    /// A region that ends before `size` yields a truncated snapshot rather
    /// than a failure, since callers guess region extents conservatively.
    pub fn take_snapshot(&self, base: usize, size: usize) -> Result<MemorySnapshot> {
        if base == 0 {
            return Err(Error::InvalidAddress(0));
        }
        if size == 0 {
            return Err(Error::Internal("Snapshot size cannot be zero".to_string()));
        }

        let data = self.access()?.read(base, size)?;
        debug!(
            base = format!("{:#x}", base),
            requested = size,
            captured = data.len(),
            head = hex::encode(&data[..data.len().min(16)]),
            "Snapshot taken"
        );
        Ok(MemorySnapshot { base, data })
    }

    /// Re-read each candidate and keep those holding exactly
    /// `expected_value` right now. Output preserves input order and is
    /// always a subset of the input; unreadable addresses are dropped.
    pub fn filter_candidates(&self, candidates: &[usize], expected_value: i32) -> Vec<usize> {
        let mut filtered = Vec::with_capacity(candidates.len());

        for &address in candidates {
            match self.read_i32(address) {
                Ok(value) if value == expected_value => filtered.push(address),
                Ok(_) => {}
                Err(e) => {
                    trace!(address = format!("{:#x}", address), error = %e, "Candidate no longer readable");
                }
            }
        }

        debug!(
            input = candidates.len(),
            kept = filtered.len(),
            "Filtered candidates"
        );
        filtered
    }

    /// Pin `value` at `address`: upsert a freeze entry and ensure the
    /// background scheduler is running.
    pub fn freeze_value(&mut self, address: usize, value: i32) -> Result<()> {
        let access = self.access()?.clone();
        self.freezes.freeze_value(access, address, &value.to_le_bytes());
        Ok(())
    }

    /// Drop all freeze entries and join the scheduler. After this returns
    /// no further write reaches the target.
    pub fn clear_freezes(&mut self) {
        self.freezes.clear_freezes();
    }

    pub fn frozen_count(&self) -> usize {
        self.freezes.active_count()
    }
}

impl Default for MemoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Diff two captures in aligned 4-byte strides over their overlapping
/// length, emitting `previous.base + offset` wherever
/// `current - previous == expected_delta` (wrapping arithmetic). Candidates
/// come out in ascending offset order; strides that exceed either buffer
/// are skipped, so no offset past `min(len) - 4` is ever produced.
///
/// Both snapshots must come from the same live target and base region;
/// that is deliberately not verified here, matching the raw byte-offset
/// contract of the capture.
pub fn compare_snapshots(
    previous: &MemorySnapshot,
    current: &MemorySnapshot,
    expected_delta: i32,
) -> Vec<usize> {
    let mut results = Vec::new();
    let count = previous.data.len().min(current.data.len());

    let mut offset = 0;
    while offset + VALUE_SIZE <= count {
        let prev_value = i32_at(&previous.data, offset);
        let curr_value = i32_at(&current.data, offset);
        if curr_value.wrapping_sub(prev_value) == expected_delta {
            results.push(previous.base + offset);
        }
        offset += VALUE_SIZE;
    }

    debug!(candidates = results.len(), "Compared snapshots");
    results
}

/// Bounds-checked little-endian i32 at `offset`; zero when out of range.
fn i32_at(data: &[u8], offset: usize) -> i32 {
    let arr: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .unwrap_or([0; 4]);
    i32::from_le_bytes(arr)
}
