//! Lock handle and lock information structures.

use super::liveness::{Liveness, LivenessProbe, SystemProbe};
use super::metadata::LockMetadata;
use crate::config::LockConfig;
use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Lower bound for the poll interval so a waiting acquire always sleeps.
pub(super) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A handle on an inter-process lock backed by a token file.
///
/// Handles are independent: two handles on the same path, in one process or
/// in two, contend for the token exactly like strangers do. A handle that
/// still holds the token when dropped releases it.
#[derive(Debug)]
pub struct Lock {
    pub(super) path: PathBuf,

    /// `None` waits forever, zero makes a single attempt.
    pub(super) timeout: Option<Duration>,

    pub(super) poll_interval: Duration,

    pub(super) reclaim_stale: bool,

    pub(super) probe: Arc<dyn LivenessProbe>,

    /// Metadata this handle wrote into the token it currently holds.
    pub(super) owned: Option<LockMetadata>,
}

impl Lock {
    /// Create a handle that waits indefinitely in `acquire`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let defaults = LockConfig::default();
        Self {
            path: path.as_ref().to_path_buf(),
            timeout: None,
            poll_interval: defaults.poll_interval(),
            reclaim_stale: defaults.reclaim_stale,
            probe: Arc::new(SystemProbe),
            owned: None,
        }
    }

    /// Create a handle whose `acquire` gives up after `timeout`.
    pub fn with_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Self {
        Self::new(path).timeout(Some(timeout))
    }

    /// Create a handle from a validated [`LockConfig`].
    pub fn from_config<P: AsRef<Path>>(path: P, config: &LockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(path)
            .timeout(config.timeout())
            .poll_interval(config.poll_interval())
            .reclaim_stale(config.reclaim_stale))
    }

    /// Set the acquire timeout; `None` waits forever.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sleep between attempts while the token is held.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Enable or disable removal of tokens whose owner has died.
    pub fn reclaim_stale(mut self, reclaim: bool) -> Self {
        self.reclaim_stale = reclaim;
        self
    }

    /// Replace the process liveness probe.
    pub fn probe(mut self, probe: Arc<dyn LivenessProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Path of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle currently holds the token.
    pub fn is_held(&self) -> bool {
        self.owned.is_some()
    }
}

/// Snapshot of a token found on disk.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The token file path.
    pub path: PathBuf,

    /// The recorded owner, if the token could be parsed.
    pub metadata: Option<LockMetadata>,

    /// What the liveness probe said about the recorded owner.
    pub liveness: Liveness,
}

impl LockInfo {
    /// Whether the recorded owner is known to be dead.
    pub fn is_stale(&self) -> bool {
        self.liveness == Liveness::Dead
    }
}

impl fmt::Display for LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.metadata {
            Some(meta) => write!(
                f,
                "{} (owner: {}, pid: {}, age: {}{})",
                self.path.display(),
                meta.owner,
                meta.pid,
                meta.age_string(),
                if self.is_stale() { ", STALE" } else { "" }
            ),
            None => write!(f, "{} (owner unknown)", self.path.display()),
        }
    }
}
