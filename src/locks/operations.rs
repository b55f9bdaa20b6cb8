//! Lock acquisition, release, and inspection operations.

use super::guard::LockGuard;
use super::liveness::Liveness;
use super::metadata::LockMetadata;
use super::types::{Lock, LockInfo};
use crate::error::{LockError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Distinguishes the aside names of concurrent reclaimers in one process.
static ASIDE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Outcome of trying to create the token exclusively.
enum Create {
    Created(LockMetadata),
    Exists,
}

/// Outcome of one acquisition round.
enum Attempt {
    Acquired,
    /// Held by someone else; their metadata if it could be read.
    Blocked(Option<LockMetadata>),
}

/// What was found at the token path after a failed create.
enum Holder {
    /// The token disappeared before it could be read.
    Gone,
    /// The recorded owner is confirmed dead.
    Stale(LockMetadata),
    /// Alive, or impossible to tell.
    Live(Option<LockMetadata>),
}

impl Lock {
    /// Acquire the lock, waiting up to the configured timeout.
    ///
    /// The token is created with `create_new` semantics, so exactly one
    /// contender wins each race. While the token is held by a live owner the
    /// call sleeps one poll interval between attempts. Tokens whose owner is
    /// confirmed dead are removed and the create is retried at once.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - This handle now holds the token
    /// * `Err(LockError::Timeout)` - A live owner kept the token past the timeout
    /// * `Err(LockError::AlreadyHeld)` - This handle already holds the token
    /// * `Err(LockError::Io)` - Any filesystem error other than contention
    pub fn acquire(&mut self) -> Result<()> {
        if self.owned.is_some() {
            return Err(LockError::AlreadyHeld {
                path: self.path.clone(),
            });
        }

        let start = Instant::now();
        // An overflowing deadline is as good as none.
        let deadline = self.timeout.and_then(|t| start.checked_add(t));
        let mut reported = false;

        loop {
            let holder = match self.attempt()? {
                Attempt::Acquired => {
                    debug!(path = %self.path.display(), waited_ms = log_millis(start.elapsed()), "lock acquired");
                    return Ok(());
                }
                Attempt::Blocked(holder) => holder,
            };

            let sleep_for = match deadline {
                None => self.poll_interval,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        let waited = now.duration_since(start);
                        debug!(path = %self.path.display(), waited_ms = log_millis(waited), "lock acquisition timed out");
                        return Err(LockError::Timeout {
                            path: self.path.clone(),
                            waited,
                        });
                    }
                    self.poll_interval.min(deadline - now)
                }
            };

            if !reported {
                reported = true;
                debug!(
                    path = %self.path.display(),
                    pid = holder.map(|m| m.pid),
                    "lock is held, waiting"
                );
            }

            thread::sleep(sleep_for);
        }
    }

    /// Make a single non-blocking attempt to acquire the lock.
    ///
    /// Stale tokens are still reclaimed.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - This handle now holds the token
    /// * `Ok(false)` - The token is held by a live (or unknown) owner
    pub fn try_acquire(&mut self) -> Result<bool> {
        if self.owned.is_some() {
            return Err(LockError::AlreadyHeld {
                path: self.path.clone(),
            });
        }

        Ok(matches!(self.attempt()?, Attempt::Acquired))
    }

    /// Acquire the lock and return a guard that releases it when dropped.
    pub fn lock(&mut self) -> Result<LockGuard<'_>> {
        self.acquire()?;
        Ok(LockGuard::new(self))
    }

    /// Release the lock held by this handle.
    ///
    /// The token is only deleted if it still carries the metadata this handle
    /// wrote, so a token re-created by someone else is never touched.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The token was removed
    /// * `Err(LockError::NotOwner)` - This handle does not hold the lock
    /// * `Err(LockError::TokenLost)` - The token vanished or was replaced
    /// * `Err(LockError::Io)` - The token could not be read or removed
    pub fn release(&mut self) -> Result<()> {
        let Some(owned) = self.owned.as_ref() else {
            return Err(LockError::NotOwner {
                path: self.path.clone(),
            });
        };

        let on_disk = match fs::read_to_string(&self.path) {
            Ok(content) => LockMetadata::from_json(&content).ok(),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                return Err(LockError::io(
                    format!("failed to read lock '{}'", self.path.display()),
                    e,
                ));
            }
        };

        if on_disk.as_ref() != Some(owned) {
            self.owned = None;
            warn!(path = %self.path.display(), "lock token was removed or replaced while held");
            return Err(LockError::TokenLost {
                path: self.path.clone(),
            });
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.owned = None;
                return Err(LockError::TokenLost {
                    path: self.path.clone(),
                });
            }
            Err(e) => {
                return Err(LockError::io(
                    format!("failed to release lock '{}'", self.path.display()),
                    e,
                ));
            }
        }

        self.owned = None;
        debug!(path = %self.path.display(), "lock released");
        Ok(())
    }

    /// Whether a token exists at the path right now.
    ///
    /// The answer may be outdated as soon as it is returned. Stale tokens
    /// count as locked; this never reclaims anything.
    pub fn is_locked(&self) -> bool {
        self.path.exists()
    }

    /// Describe the token currently on disk, if any.
    pub fn inspect(&self) -> Result<Option<LockInfo>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LockError::io(
                    format!("failed to read lock '{}'", self.path.display()),
                    e,
                ));
            }
        };

        let metadata = LockMetadata::from_json(&content).ok();
        let liveness = match &metadata {
            Some(meta) => self.owner_liveness(meta),
            None => Liveness::Unknown,
        };

        Ok(Some(LockInfo {
            path: self.path.clone(),
            metadata,
            liveness,
        }))
    }

    /// Forcibly remove the token, whoever owns it.
    ///
    /// This is an operator escape hatch for tokens the automatic reclamation
    /// will not touch (unreadable content, owners on other hosts). The caller
    /// is responsible for making sure no live owner still relies on it.
    ///
    /// # Returns
    ///
    /// * `Ok(LockInfo)` - What the removed token described
    /// * `Err(LockError::NotLocked)` - There was no token
    pub fn break_lock(&mut self) -> Result<LockInfo> {
        let info = self.inspect()?.ok_or_else(|| LockError::NotLocked {
            path: self.path.clone(),
        })?;

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LockError::NotLocked {
                    path: self.path.clone(),
                });
            }
            Err(e) => {
                return Err(LockError::io(
                    format!("failed to break lock '{}'", self.path.display()),
                    e,
                ));
            }
        }

        if info.metadata.is_some() && info.metadata == self.owned {
            self.owned = None;
        }

        warn!(path = %self.path.display(), "lock broken: {}", info);
        Ok(info)
    }

    /// One round of create, inspect, and (maybe) reclaim.
    ///
    /// Stale reclamation does not count as waiting: after a successful
    /// removal the create is retried immediately.
    fn attempt(&mut self) -> Result<Attempt> {
        loop {
            if let Create::Created(meta) = self.create_token()? {
                self.owned = Some(meta);
                return Ok(Attempt::Acquired);
            }

            match self.read_holder() {
                Holder::Gone => continue,
                Holder::Stale(meta) if self.reclaim_stale => {
                    if !self.remove_stale(&meta) {
                        return Ok(Attempt::Blocked(Some(meta)));
                    }
                }
                Holder::Stale(meta) => return Ok(Attempt::Blocked(Some(meta))),
                Holder::Live(meta) => return Ok(Attempt::Blocked(meta)),
            }
        }
    }

    fn create_token(&self) -> Result<Create> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(Create::Exists),
            Err(e) => {
                return Err(LockError::io(
                    format!("failed to create lock '{}'", self.path.display()),
                    e,
                ));
            }
        };

        let metadata = LockMetadata::current();
        let written = metadata.to_json().and_then(|json| {
            file.write_all(json.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| {
                    LockError::io(
                        format!("failed to write lock metadata to '{}'", self.path.display()),
                        e,
                    )
                })
        });

        if let Err(e) = written {
            drop(file);
            // The half-written token is ours; do not leave it behind.
            if let Err(remove_err) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), "failed to remove partial lock token: {}", remove_err);
            }
            return Err(e);
        }

        Ok(Create::Created(metadata))
    }

    fn read_holder(&self) -> Holder {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Holder::Gone,
            Err(_) => return Holder::Live(None),
        };

        // Empty or partial content means the creator is still writing.
        let Ok(meta) = LockMetadata::from_json(&content) else {
            return Holder::Live(None);
        };

        match self.owner_liveness(&meta) {
            Liveness::Dead => Holder::Stale(meta),
            Liveness::Alive | Liveness::Unknown => Holder::Live(Some(meta)),
        }
    }

    fn owner_liveness(&self, meta: &LockMetadata) -> Liveness {
        if !meta.is_local() {
            return Liveness::Unknown;
        }
        self.probe.check(meta.pid)
    }

    /// Remove a token whose owner is dead, if it is still that same token.
    ///
    /// The token is first renamed to a name private to this handle, so the
    /// check and the unlink act on the same file. If what was moved turns
    /// out to be a newer token, it is linked back into place.
    ///
    /// Returns whether the next create attempt should follow immediately.
    pub(super) fn remove_stale(&self, stale: &LockMetadata) -> bool {
        let aside = self.aside_path();
        match fs::rename(&self.path, &aside) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return true,
            Err(e) => {
                warn!(path = %self.path.display(), pid = stale.pid, "failed to move stale lock aside: {}", e);
                return false;
            }
        }

        let moved = fs::read_to_string(&aside)
            .ok()
            .and_then(|content| LockMetadata::from_json(&content).ok());

        if moved.as_ref() == Some(stale) {
            info!(
                path = %self.path.display(),
                pid = stale.pid,
                "reclaimed lock from dead owner {}",
                stale.owner
            );
        } else if let Err(e) = fs::hard_link(&aside, &self.path) {
            // Someone created a token in the meantime; the moved one is lost.
            warn!(path = %self.path.display(), "failed to restore lock token moved aside: {}", e);
        }

        if let Err(e) = fs::remove_file(&aside) {
            warn!(path = %aside.display(), "failed to remove moved lock token: {}", e);
        }
        true
    }

    /// A sibling path no other handle will use.
    fn aside_path(&self) -> PathBuf {
        let seq = ASIDE_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(".stale.{}.{}", std::process::id(), seq));
        self.path.with_file_name(name)
    }
}

/// Milliseconds for log fields, saturating instead of truncating.
pub(super) fn log_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Drop for Lock {
    fn drop(&mut self) {
        if self.owned.is_some()
            && let Err(e) = self.release()
        {
            warn!(path = %self.path.display(), "failed to release lock on drop: {}", e);
        }
    }
}
