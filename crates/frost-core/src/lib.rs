//! Frost Core Engine
//!
//! Process attachment, memory snapshot scanning, value freezing and the
//! built-in mod set. The engine talks to targets through the
//! [`backend::MemoryAccess`] seam, so everything above the backend layer is
//! testable against simulated process memory.

pub mod backend;
pub mod config;
pub mod freeze;
pub mod mods;
pub mod process;
pub mod scanner;

pub use backend::{MemoryAccess, ProcessApi};
pub use config::ConfigStore;
pub use freeze::{run_freeze_pass, FreezeScheduler, FREEZE_INTERVAL};
pub use mods::{Mod, ModKind, ModManager};
pub use process::ProcessManager;
pub use scanner::{compare_snapshots, MemoryScanner};

pub use frost_common::{Error, Result};
