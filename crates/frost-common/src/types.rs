//! Shared data types for the frost toolkit

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One running process as seen by enumeration.
///
/// Produced transiently; a fresh enumeration supersedes any earlier list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    /// Matches the attach denylist (see `policy`). Display layers grey these
    /// out; the gate rejects them regardless.
    pub blocked: bool,
}

/// A byte range captured from the target at one instant.
///
/// Two snapshots are only meaningfully comparable when captured against the
/// same live target and base region. The engine does not tag or verify this;
/// it is a caller contract, kept deliberately unenforced to match the raw
/// byte-offset semantics of the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Absolute address the first byte was read from.
    pub base: usize,
    /// Captured bytes. May be shorter than requested when the region ended
    /// before the requested size; never padded.
    pub data: Vec<u8>,
}

impl MemorySnapshot {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An address pinned to a value by the freeze scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeEntry {
    pub address: usize,
    /// Raw bytes rewritten every scheduler pass.
    pub value: Vec<u8>,
    pub active: bool,
}

/// Persisted enable state for one mod.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModState {
    #[serde(default)]
    pub enabled: bool,
}

/// Per-process persisted configuration: named addresses plus mod toggles.
///
/// Plain key/value data; owns no scanner or gate state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default)]
    pub addresses: BTreeMap<String, usize>,
    #[serde(default)]
    pub mods: BTreeMap<String, ModState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_len() {
        let snap = MemorySnapshot {
            base: 0x1000,
            data: vec![1, 2, 3],
        };
        assert_eq!(snap.len(), 3);
        assert!(!snap.is_empty());

        let empty = MemorySnapshot {
            base: 0x1000,
            data: Vec::new(),
        };
        assert!(empty.is_empty());
    }

    #[test]
    fn test_process_config_roundtrip() {
        let mut config = ProcessConfig::default();
        config.addresses.insert("ammo".to_string(), 0x1234);
        config
            .mods
            .insert("god_mode".to_string(), ModState { enabled: true });

        let json = serde_json::to_string(&config).unwrap();
        let parsed: ProcessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_process_config_missing_fields() {
        // Older config files may carry only one of the two maps.
        let parsed: ProcessConfig = serde_json::from_str(r#"{"addresses":{"hp":4096}}"#).unwrap();
        assert_eq!(parsed.addresses.get("hp"), Some(&4096));
        assert!(parsed.mods.is_empty());
    }

    #[test]
    fn test_process_entry_serialization() {
        let entry = ProcessEntry {
            pid: 42,
            name: "game.exe".to_string(),
            blocked: false,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("game.exe"));
        let parsed: ProcessEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
