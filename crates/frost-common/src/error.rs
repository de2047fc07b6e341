//! Error types for frost

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The target process is on the attach denylist. Never overridable.
    #[error("Attach refused by policy: {0}")]
    PolicyDenied(String),

    /// An operation requiring an attached process ran without one.
    #[error("No process handle bound")]
    HandleUnavailable,

    /// The OS reported fewer bytes transferred than requested. A half-written
    /// value is worse than an unwritten one, so this equals total failure.
    #[error("Partial transfer at {address:#x}: expected {expected} bytes, got {actual}")]
    PartialTransfer {
        address: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Memory access error at {address:#x}: {message}")]
    MemoryAccess { address: usize, message: String },

    #[error("Invalid address: {0:#x}")]
    InvalidAddress(usize),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_denied_display() {
        let err = Error::PolicyDenied("valorant.exe".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("valorant.exe"));
        assert!(msg.contains("policy"));
    }

    #[test]
    fn test_partial_transfer_display() {
        let err = Error::PartialTransfer {
            address: 0x1000,
            expected: 4,
            actual: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("0x1000"));
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_memory_access_display() {
        let err = Error::MemoryAccess {
            address: 0xDEADBEEF,
            message: "Access denied".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("0xdeadbeef"));
        assert!(msg.contains("Access denied"));
    }

    #[test]
    fn test_handle_unavailable_display() {
        let msg = format!("{}", Error::HandleUnavailable);
        assert!(msg.contains("No process handle"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_err() -> Result<i32> {
            Err(Error::HandleUnavailable)
        }
        assert!(returns_err().is_err());
    }
}
