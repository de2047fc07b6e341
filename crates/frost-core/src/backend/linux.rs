//! Linux backend
//!
//! Uses `process_vm_readv`/`process_vm_writev` for memory transfer and the
//! `/proc` filesystem for enumeration and name resolution. No persistent
//! kernel handle exists on this platform; the pid itself is the capability
//! and permission is checked per call.

use super::{MemoryAccess, ProcessApi};
use frost_common::{Error, Result};
use std::sync::Arc;

/// Native process API for Linux.
pub struct LinuxApi;

impl LinuxApi {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Read `/proc/<pid>/comm`, the kernel-truncated process name.
fn process_name(pid: u32) -> Option<String> {
    let comm = std::fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
    let name = comm.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

impl ProcessApi for LinuxApi {
    fn enumerate(&self) -> Result<Vec<(u32, String)>> {
        let entries = std::fs::read_dir("/proc")
            .map_err(|e| Error::ProcessNotFound(format!("Failed to read /proc: {}", e)))?;

        let mut processes = Vec::new();
        for entry in entries.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };
            if let Some(name) = process_name(pid) {
                processes.push((pid, name));
            }
        }

        Ok(processes)
    }

    fn open(&self, pid: u32) -> Result<(String, Arc<dyn MemoryAccess>)> {
        let name = process_name(pid)
            .ok_or_else(|| Error::ProcessNotFound(format!("No such process: {}", pid)))?;

        Ok((name, Arc::new(LinuxMemory { pid: pid as libc::pid_t })))
    }
}

struct LinuxMemory {
    pid: libc::pid_t,
}

impl MemoryAccess for LinuxMemory {
    fn read(&self, address: usize, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];

        let local = libc::iovec {
            iov_base: buffer.as_mut_ptr() as *mut libc::c_void,
            iov_len: size,
        };
        let remote = libc::iovec {
            iov_base: address as *mut libc::c_void,
            iov_len: size,
        };

        let transferred = unsafe { libc::process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };
        if transferred < 0 {
            return Err(Error::MemoryAccess {
                address,
                message: format!(
                    "process_vm_readv failed: {}",
                    std::io::Error::last_os_error()
                ),
            });
        }

        buffer.truncate(transferred as usize);
        Ok(buffer)
    }

    fn write(&self, address: usize, data: &[u8]) -> Result<()> {
        let local = libc::iovec {
            iov_base: data.as_ptr() as *mut libc::c_void,
            iov_len: data.len(),
        };
        let remote = libc::iovec {
            iov_base: address as *mut libc::c_void,
            iov_len: data.len(),
        };

        let transferred = unsafe { libc::process_vm_writev(self.pid, &local, 1, &remote, 1, 0) };
        if transferred < 0 {
            return Err(Error::MemoryAccess {
                address,
                message: format!(
                    "process_vm_writev failed: {}",
                    std::io::Error::last_os_error()
                ),
            });
        }

        if transferred as usize != data.len() {
            return Err(Error::PartialTransfer {
                address,
                expected: data.len(),
                actual: transferred as usize,
            });
        }

        Ok(())
    }
}
