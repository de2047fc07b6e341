//! Mock backend
//!
//! In-memory stand-in for the native backend so the gate, scanner and
//! freeze scheduler can be exercised without a live target process. Tests
//! mutate the store directly through [`MockProcess::poke`] to simulate the
//! target overwriting its own values between passes.

use super::{MemoryAccess, ProcessApi};
use frost_common::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Byte store for one simulated process.
#[derive(Default)]
struct MockStore {
    /// Base address -> region bytes.
    regions: HashMap<usize, Vec<u8>>,
}

impl MockStore {
    fn locate(&self, address: usize) -> Option<(usize, usize)> {
        for (&base, data) in &self.regions {
            if address >= base && address < base + data.len() {
                return Some((base, address - base));
            }
        }
        None
    }
}

/// One simulated process, shared between the test and the code under test.
pub struct MockProcess {
    store: RwLock<MockStore>,
}

impl MockProcess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store: RwLock::new(MockStore::default()),
        })
    }

    /// Install (or replace) a region of backing memory.
    pub fn install_region(&self, base: usize, data: &[u8]) {
        if let Ok(mut store) = self.store.write() {
            store.regions.insert(base, data.to_vec());
        }
    }

    /// Mutate the store directly, bypassing the `MemoryAccess` seam. This is
    /// the "external write" in tests: the target changing its own values.
    pub fn poke(&self, address: usize, data: &[u8]) {
        let Ok(mut store) = self.store.write() else {
            return;
        };
        let Some((base, offset)) = store.locate(address) else {
            return;
        };
        if let Some(region) = store.regions.get_mut(&base) {
            let end = (offset + data.len()).min(region.len());
            region[offset..end].copy_from_slice(&data[..end - offset]);
        }
    }

    /// Read an i32 straight out of the store.
    pub fn peek_i32(&self, address: usize) -> Option<i32> {
        let store = self.store.read().ok()?;
        let (base, offset) = store.locate(address)?;
        let region = store.regions.get(&base)?;
        let bytes: [u8; 4] = region.get(offset..offset + 4)?.try_into().ok()?;
        Some(i32::from_le_bytes(bytes))
    }
}

impl MemoryAccess for MockProcess {
    fn read(&self, address: usize, size: usize) -> Result<Vec<u8>> {
        let store = self.store.read().map_err(|e| Error::Internal(e.to_string()))?;
        let (base, offset) = store.locate(address).ok_or(Error::MemoryAccess {
            address,
            message: "Address not mapped in mock memory".to_string(),
        })?;
        // Like a real region tail: hand back what exists, never pad.
        let region = &store.regions[&base];
        let available = region.len() - offset;
        Ok(region[offset..offset + size.min(available)].to_vec())
    }

    fn write(&self, address: usize, data: &[u8]) -> Result<()> {
        let mut store = self.store.write().map_err(|e| Error::Internal(e.to_string()))?;
        let Some((base, offset)) = store.locate(address) else {
            return Err(Error::MemoryAccess {
                address,
                message: "Address not mapped in mock memory".to_string(),
            });
        };
        let Some(region) = store.regions.get_mut(&base) else {
            return Err(Error::MemoryAccess {
                address,
                message: "Region vanished from mock memory".to_string(),
            });
        };
        if offset + data.len() > region.len() {
            return Err(Error::PartialTransfer {
                address,
                expected: data.len(),
                actual: region.len() - offset,
            });
        }
        region[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// Process API over a fixed set of simulated processes.
#[derive(Default)]
pub struct MockApi {
    processes: Vec<(u32, String, Arc<MockProcess>)>,
    fail_enumeration: bool,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a simulated process and return its shared memory store.
    pub fn add_process(&mut self, pid: u32, name: &str) -> Arc<MockProcess> {
        let process = MockProcess::new();
        self.processes.push((pid, name.to_string(), process.clone()));
        process
    }

    /// Make `enumerate` fail, as when the caller lacks privileges.
    pub fn fail_enumeration(&mut self) {
        self.fail_enumeration = true;
    }
}

impl ProcessApi for MockApi {
    fn enumerate(&self) -> Result<Vec<(u32, String)>> {
        if self.fail_enumeration {
            return Err(Error::ProcessNotFound(
                "Enumeration denied by mock".to_string(),
            ));
        }
        Ok(self
            .processes
            .iter()
            .map(|(pid, name, _)| (*pid, name.clone()))
            .collect())
    }

    fn open(&self, pid: u32) -> Result<(String, Arc<dyn MemoryAccess>)> {
        self.processes
            .iter()
            .find(|(p, _, _)| *p == pid)
            .map(|(_, name, process)| {
                (name.clone(), process.clone() as Arc<dyn MemoryAccess>)
            })
            .ok_or_else(|| Error::ProcessNotFound(format!("No such mock process: {}", pid)))
    }
}
