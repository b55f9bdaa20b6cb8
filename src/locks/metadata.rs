//! Lock token metadata and utilities.

use crate::error::{LockError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Metadata stored in a lock token.
///
/// The record identifies the process that created the token. It is used for
/// stale-owner diagnosis and for the release-time identity check, never to
/// decide who may create the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Hostname of the machine the owning process runs on.
    pub host: String,

    /// Process ID of the lock holder.
    pub pid: u32,

    /// Timestamp when the token was created (RFC3339).
    pub created_at: DateTime<Utc>,
}

impl LockMetadata {
    /// Metadata describing the current process, stamped now.
    pub fn current() -> Self {
        Self {
            owner: get_owner_string(),
            host: local_host(),
            pid: std::process::id(),
            created_at: Utc::now(),
        }
    }

    /// Parse lock metadata from a token file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LockError::io(format!("failed to read lock file '{}'", path.display()), e)
        })?;

        Self::from_json(&content)
    }

    /// Parse lock metadata from the JSON content of a token.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| LockError::Metadata(e.to_string()))
    }

    /// Serialize lock metadata to JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LockError::Metadata(format!("failed to serialize lock metadata: {}", e)))
    }

    /// Whether the owning process runs on this machine.
    ///
    /// Process IDs are only meaningful on the host that issued them.
    pub fn is_local(&self) -> bool {
        self.host == local_host()
    }

    /// Calculate the age of the token.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", seconds.max(0))
        }
    }
}

/// Hostname of this machine, or `unknown` if it cannot be determined.
pub(crate) fn local_host() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Get the owner string for lock metadata.
pub(crate) fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, local_host())
}
