//! Backend abstraction layer
//!
//! Platform-independent seams for the two OS facilities frost needs:
//! enumerating/opening processes and raw memory transfer through an open
//! handle. The rest of the crate works against these traits, so the scanner
//! and freeze scheduler run unchanged over the native backend or the mock.

use frost_common::Result;
use std::sync::Arc;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::WindowsApi as NativeApi;

#[cfg(unix)]
mod linux;
#[cfg(unix)]
pub use self::linux::LinuxApi as NativeApi;

pub mod mock;

/// Raw memory transfer against one open process handle.
///
/// This is the atomic primitive everything else builds on. Implementations
/// must be callable from the freeze scheduler's background thread.
pub trait MemoryAccess: Send + Sync {
    /// Read up to `size` bytes starting at `address`.
    ///
    /// May return fewer bytes than requested when the readable region ends
    /// early; returns an error only when nothing could be read.
    fn read(&self, address: usize, size: usize) -> Result<Vec<u8>>;

    /// Write `data` at `address`. A partial transfer is an error: a value
    /// meant to be exact must not be half-written.
    fn write(&self, address: usize, data: &[u8]) -> Result<()>;
}

/// Process discovery and handle opening.
pub trait ProcessApi {
    /// List `(pid, name)` for processes visible at the caller's privilege
    /// level. Order is unspecified; the gate sorts for display.
    fn enumerate(&self) -> Result<Vec<(u32, String)>>;

    /// Open a read/write/query handle for `pid` and resolve its name.
    fn open(&self, pid: u32) -> Result<(String, Arc<dyn MemoryAccess>)>;
}
