//! LockConfig struct definition and default implementation.

use serde::{Deserialize, Serialize};

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Tunables for lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Maximum time `acquire` waits, in milliseconds.
    ///
    /// `None` waits indefinitely; `Some(0)` makes a single attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Sleep between attempts while the token is held by a live owner.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Whether tokens left behind by dead processes are removed.
    #[serde(default = "default_true")]
    pub reclaim_stale: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            poll_interval_ms: default_poll_interval_ms(),
            reclaim_stale: default_true(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_true() -> bool {
    true
}
