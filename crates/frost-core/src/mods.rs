//! Built-in mods
//!
//! A mod is a capability over the scanner, identified by a tagged kind
//! rather than a type hierarchy. Each mod pins one address (found by the
//! operator through scanning) to its kind's value; `on_tick` keeps the
//! freeze entry current and `on_detach` forgets the address, since pinned
//! addresses are meaningless across target sessions.

use crate::scanner::MemoryScanner;
use frost_common::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The built-in capability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModKind {
    GodMode,
    InfiniteAmmo,
}

impl ModKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModKind::GodMode => "god_mode",
            ModKind::InfiniteAmmo => "infinite_ammo",
        }
    }

    /// Value pinned when no override is set.
    pub fn default_value(&self) -> i32 {
        match self {
            ModKind::GodMode => 100,
            ModKind::InfiniteAmmo => 999,
        }
    }
}

/// One capability instance.
pub struct Mod {
    pub kind: ModKind,
    enabled: bool,
    pinned_address: Option<usize>,
    desired_value: Option<i32>,
}

impl Mod {
    pub fn new(kind: ModKind) -> Self {
        Self {
            kind,
            enabled: false,
            pinned_address: None,
            desired_value: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether this mod can run against the named target. All built-in mods
    /// are generic; only a nameless target is rejected.
    pub fn is_compatible(&self, process_name: &str) -> bool {
        !process_name.is_empty()
    }

    /// Record the address the operator's scan converged on.
    pub fn pin(&mut self, address: usize) {
        self.pinned_address = Some(address);
    }

    pub fn pinned_address(&self) -> Option<usize> {
        self.pinned_address
    }

    /// Override the pinned value. `None` falls back to the kind default.
    pub fn set_desired_value(&mut self, value: Option<i32>) {
        self.desired_value = value;
    }

    pub fn effective_value(&self) -> i32 {
        self.desired_value.unwrap_or_else(|| self.kind.default_value())
    }

    pub fn on_attach(&mut self, process_name: &str) {
        info!(mod_name = self.kind.name(), process = process_name, "Mod armed");
    }

    /// Keep the freeze entry for the pinned address current. Without a
    /// pinned address there is nothing to do yet.
    pub fn on_tick(&self, scanner: &mut MemoryScanner) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        match self.pinned_address {
            Some(address) => scanner.freeze_value(address, self.effective_value()),
            None => {
                debug!(mod_name = self.kind.name(), "Waiting for a pinned address");
                Ok(())
            }
        }
    }

    /// Forget session-local state. Pinned addresses do not survive the
    /// target process.
    pub fn on_detach(&mut self) {
        self.enabled = false;
        self.pinned_address = None;
        self.desired_value = None;
    }
}

/// Holds the built-in mod set and fans lifecycle calls out to it.
pub struct ModManager {
    mods: Vec<Mod>,
}

impl ModManager {
    pub fn new() -> Self {
        Self {
            mods: vec![Mod::new(ModKind::GodMode), Mod::new(ModKind::InfiniteAmmo)],
        }
    }

    pub fn mods(&self) -> &[Mod] {
        &self.mods
    }

    pub fn get_mut(&mut self, kind: ModKind) -> Option<&mut Mod> {
        self.mods.iter_mut().find(|m| m.kind == kind)
    }

    pub fn set_enabled(&mut self, kind: ModKind, enabled: bool) {
        if let Some(m) = self.get_mut(kind) {
            m.set_enabled(enabled);
        }
    }

    /// Arm every mod compatible with the newly attached target.
    pub fn attach_all(&mut self, process_name: &str) {
        for m in &mut self.mods {
            if m.is_compatible(process_name) {
                m.on_attach(process_name);
            }
        }
    }

    /// Tear down session state: one freeze clear, then per-mod reset.
    pub fn detach_all(&mut self, scanner: &mut MemoryScanner) {
        scanner.clear_freezes();
        for m in &mut self.mods {
            m.on_detach();
        }
    }

    /// Drive one tick for every enabled mod. A failing mod does not stop
    /// the others.
    pub fn tick(&mut self, scanner: &mut MemoryScanner) {
        for m in &self.mods {
            if let Err(e) = m.on_tick(scanner) {
                debug!(mod_name = m.kind.name(), error = %e, "Mod tick skipped");
            }
        }
    }
}

impl Default for ModManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockProcess;

    fn bound_scanner(process: &std::sync::Arc<MockProcess>) -> MemoryScanner {
        let mut scanner = MemoryScanner::new();
        scanner.bind(process.clone());
        scanner
    }

    #[test]
    fn test_kind_defaults() {
        assert_eq!(ModKind::GodMode.default_value(), 100);
        assert_eq!(ModKind::InfiniteAmmo.default_value(), 999);
        assert_eq!(ModKind::GodMode.name(), "god_mode");
    }

    #[test]
    fn test_kind_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ModKind::InfiniteAmmo).unwrap(),
            "\"infinite_ammo\""
        );
        let parsed: ModKind = serde_json::from_str("\"god_mode\"").unwrap();
        assert_eq!(parsed, ModKind::GodMode);
    }

    #[test]
    fn test_compatible_with_any_named_process() {
        let m = Mod::new(ModKind::GodMode);
        assert!(m.is_compatible("game.exe"));
        assert!(!m.is_compatible(""));
    }

    #[test]
    fn test_tick_freezes_pinned_address() {
        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 4]);
        let mut scanner = bound_scanner(&process);

        let mut m = Mod::new(ModKind::GodMode);
        m.set_enabled(true);
        m.pin(0x1000);
        m.on_tick(&mut scanner).unwrap();

        assert_eq!(scanner.frozen_count(), 1);
        std::thread::sleep(crate::freeze::FREEZE_INTERVAL * 3);
        assert_eq!(process.peek_i32(0x1000), Some(100));
        scanner.clear_freezes();
    }

    #[test]
    fn test_tick_without_pin_is_noop() {
        let process = MockProcess::new();
        let mut scanner = bound_scanner(&process);

        let mut m = Mod::new(ModKind::InfiniteAmmo);
        m.set_enabled(true);
        m.on_tick(&mut scanner).unwrap();
        assert_eq!(scanner.frozen_count(), 0);
    }

    #[test]
    fn test_disabled_mod_does_not_freeze() {
        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 4]);
        let mut scanner = bound_scanner(&process);

        let mut m = Mod::new(ModKind::GodMode);
        m.pin(0x1000);
        m.on_tick(&mut scanner).unwrap();
        assert_eq!(scanner.frozen_count(), 0);
    }

    #[test]
    fn test_desired_value_overrides_default() {
        let mut m = Mod::new(ModKind::InfiniteAmmo);
        assert_eq!(m.effective_value(), 999);
        m.set_desired_value(Some(250));
        assert_eq!(m.effective_value(), 250);
        m.set_desired_value(None);
        assert_eq!(m.effective_value(), 999);
    }

    #[test]
    fn test_detach_all_clears_state() {
        let process = MockProcess::new();
        process.install_region(0x1000, &[0; 8]);
        let mut scanner = bound_scanner(&process);

        let mut manager = ModManager::new();
        manager.set_enabled(ModKind::GodMode, true);
        manager.get_mut(ModKind::GodMode).unwrap().pin(0x1000);
        manager.tick(&mut scanner);
        assert_eq!(scanner.frozen_count(), 1);

        manager.detach_all(&mut scanner);
        assert_eq!(scanner.frozen_count(), 0);
        for m in manager.mods() {
            assert!(!m.is_enabled());
            assert!(m.pinned_address().is_none());
        }
    }

    #[test]
    fn test_tick_survives_unbound_scanner() {
        let mut scanner = MemoryScanner::new();
        let mut manager = ModManager::new();
        manager.set_enabled(ModKind::GodMode, true);
        manager.get_mut(ModKind::GodMode).unwrap().pin(0x1000);
        // Freeze fails with no handle; tick must not panic.
        manager.tick(&mut scanner);
        assert_eq!(scanner.frozen_count(), 0);
    }
}
