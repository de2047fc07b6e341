//! Windows backend
//!
//! Opens targets with `OpenProcess` and transfers bytes with
//! `ReadProcessMemory`/`WriteProcessMemory`. Enumeration walks
//! `EnumProcesses` and resolves names via `GetModuleBaseNameW`.

use super::{MemoryAccess, ProcessApi};
use frost_common::{Error, Result};
use std::ffi::c_void;
use std::sync::Arc;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
use windows::Win32::System::ProcessStatus::{EnumProcesses, GetModuleBaseNameW};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
    PROCESS_VM_WRITE,
};

/// Native process API for Windows.
pub struct WindowsApi;

impl WindowsApi {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the base module name of an open process handle.
fn process_base_name(handle: HANDLE) -> Option<String> {
    let mut buffer = [0u16; 260];
    let len = unsafe { GetModuleBaseNameW(handle, None, &mut buffer) } as usize;
    if len == 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buffer[..len]))
}

impl ProcessApi for WindowsApi {
    fn enumerate(&self) -> Result<Vec<(u32, String)>> {
        let mut pids = vec![0u32; 1024];
        let mut bytes_returned = 0u32;

        unsafe {
            EnumProcesses(
                pids.as_mut_ptr(),
                (pids.len() * std::mem::size_of::<u32>()) as u32,
                &mut bytes_returned,
            )
        }
        .map_err(|e| Error::ProcessNotFound(format!("EnumProcesses failed: {}", e)))?;

        let count = bytes_returned as usize / std::mem::size_of::<u32>();
        let mut processes = Vec::with_capacity(count);

        for &pid in pids.iter().take(count) {
            if pid == 0 {
                continue;
            }
            let Ok(handle) = (unsafe {
                OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid)
            }) else {
                continue;
            };
            if let Some(name) = process_base_name(handle) {
                processes.push((pid, name));
            }
            unsafe {
                let _ = CloseHandle(handle);
            }
        }

        Ok(processes)
    }

    fn open(&self, pid: u32) -> Result<(String, Arc<dyn MemoryAccess>)> {
        let handle = unsafe {
            OpenProcess(
                PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION,
                false,
                pid,
            )
        }
        .map_err(|e| Error::ProcessNotFound(format!("OpenProcess({}) failed: {}", pid, e)))?;

        let Some(name) = process_base_name(handle) else {
            unsafe {
                let _ = CloseHandle(handle);
            }
            return Err(Error::ProcessNotFound(format!(
                "Failed to resolve name for pid {}",
                pid
            )));
        };

        Ok((name, Arc::new(WindowsMemory { handle })))
    }
}

/// One open memory handle. Closed on drop.
struct WindowsMemory {
    handle: HANDLE,
}

// HANDLE is a plain kernel handle value; the Win32 memory APIs used here are
// callable from any thread.
unsafe impl Send for WindowsMemory {}
unsafe impl Sync for WindowsMemory {}

impl Drop for WindowsMemory {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

impl MemoryAccess for WindowsMemory {
    fn read(&self, address: usize, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;

        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buffer.as_mut_ptr() as *mut c_void,
                size,
                Some(&mut bytes_read),
            )
        };

        // A failed call can still have copied a prefix (region tail); report
        // whatever arrived, and fail only when nothing did.
        if result.is_err() && bytes_read == 0 {
            return Err(Error::MemoryAccess {
                address,
                message: format!("ReadProcessMemory failed: {:?}", result),
            });
        }

        buffer.truncate(bytes_read);
        Ok(buffer)
    }

    fn write(&self, address: usize, data: &[u8]) -> Result<()> {
        let mut bytes_written = 0usize;

        unsafe {
            WriteProcessMemory(
                self.handle,
                address as *const c_void,
                data.as_ptr() as *const c_void,
                data.len(),
                Some(&mut bytes_written),
            )
        }
        .map_err(|e| Error::MemoryAccess {
            address,
            message: format!("WriteProcessMemory failed: {}", e),
        })?;

        if bytes_written != data.len() {
            return Err(Error::PartialTransfer {
                address,
                expected: data.len(),
                actual: bytes_written,
            });
        }

        Ok(())
    }
}
