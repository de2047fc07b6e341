//! Attach policy
//!
//! A fixed denylist of multiplayer / anti-cheat sensitive titles that frost
//! refuses to attach to. The check lives here so the gate and any display
//! layer apply the identical predicate instead of duplicating the list.
//! Enforcement happens at the attach boundary only; once a handle is open
//! the hot read/write path performs no name comparisons.

/// Process names frost will never attach to (compared lowercase).
const BLOCKED_PROCESSES: &[&str] = &[
    "cs2.exe",
    "valorant.exe",
    "fortnite.exe",
    "apex.exe",
    "overwatch.exe",
];

/// Case-insensitive membership test against the denylist.
pub fn is_blocked_process(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    BLOCKED_PROCESSES.iter().any(|blocked| *blocked == lowered)
}
