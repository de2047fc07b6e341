//! Frost Common Types
//!
//! Shared types, error taxonomy, logging and attach policy used by all
//! frost components.

pub mod error;
pub mod logging;
pub mod policy;
pub mod types;

pub use error::{Error, Result};
pub use logging::{clear_log_subscriber, init_logging, set_log_subscriber, LogConfig};
pub use policy::is_blocked_process;
pub use types::*;

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};
