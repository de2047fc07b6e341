//! Per-process configuration persistence
//!
//! Saved addresses and mod toggles keyed by process name, one JSON file per
//! process under a configs directory. The store is plain persistence: it
//! holds no scanner or session state and every failure degrades to a log
//! line rather than an error the caller must handle.

use frost_common::ProcessConfig;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// File-backed store for [`ProcessConfig`] values.
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `root`, created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if let Err(e) = std::fs::create_dir_all(&root) {
            error!(path = %root.display(), error = %e, "Failed to create config directory");
        }
        Self { root }
    }

    /// The conventional `./configs` location.
    pub fn open_default() -> Self {
        Self::new("configs")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the config for `process_name`, or `None` when absent or
    /// unreadable.
    pub fn load(&self, process_name: &str) -> Option<ProcessConfig> {
        let path = self.resolve_path(process_name);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                warn!(process = process_name, "No saved config");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Config file is not valid JSON");
                None
            }
        }
    }

    /// Persist `config` for `process_name`, replacing any previous file.
    pub fn save(&self, process_name: &str, config: &ProcessConfig) {
        let path = self.resolve_path(process_name);
        let json = match serde_json::to_string_pretty(config) {
            Ok(json) => json,
            Err(e) => {
                error!(process = process_name, error = %e, "Failed to serialize config");
                return;
            }
        };

        match std::fs::write(&path, json) {
            Ok(()) => info!(path = %path.display(), "Config saved"),
            Err(e) => error!(path = %path.display(), error = %e, "Failed to write config"),
        }
    }

    /// Process names become file names; spaces and drive-separator colons
    /// are flattened to underscores.
    fn resolve_path(&self, process_name: &str) -> PathBuf {
        let sanitized: String = process_name
            .chars()
            .map(|c| if c == ' ' || c == ':' { '_' } else { c })
            .collect();
        self.root.join(format!("{}.json", sanitized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frost_common::ModState;

    fn scratch_store() -> ConfigStore {
        let dir = std::env::temp_dir().join(format!(
            "frost-config-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .subsec_nanos()
        ));
        ConfigStore::new(dir)
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = scratch_store();

        let mut config = ProcessConfig::default();
        config.addresses.insert("health".to_string(), 0xDEAD);
        config
            .mods
            .insert("god_mode".to_string(), ModState { enabled: true });

        store.save("game.exe", &config);
        let loaded = store.load("game.exe").expect("config must load back");
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_load_missing_is_none() {
        let store = scratch_store();
        assert!(store.load("never-saved.exe").is_none());
        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_load_corrupt_is_none() {
        let store = scratch_store();
        std::fs::write(store.resolve_path("broken.exe"), "{not json").unwrap();
        assert!(store.load("broken.exe").is_none());
        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_path_sanitization() {
        let store = scratch_store();
        let path = store.resolve_path("My Game: Remastered.exe");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "My_Game__Remastered.exe.json"
        );

        let mut config = ProcessConfig::default();
        config.addresses.insert("ammo".to_string(), 0x10);
        store.save("My Game: Remastered.exe", &config);
        assert!(store.load("My Game: Remastered.exe").is_some());

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let store = scratch_store();

        let mut first = ProcessConfig::default();
        first.addresses.insert("hp".to_string(), 1);
        store.save("game.exe", &first);

        let mut second = ProcessConfig::default();
        second.addresses.insert("hp".to_string(), 2);
        store.save("game.exe", &second);

        assert_eq!(store.load("game.exe").unwrap(), second);
        let _ = std::fs::remove_dir_all(store.root());
    }
}
