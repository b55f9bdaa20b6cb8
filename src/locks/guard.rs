//! RAII lock guard implementation.

use super::types::Lock;
use crate::error::Result;
use std::path::Path;
use tracing::warn;

/// RAII guard for a held lock.
///
/// Returned by [`Lock::lock`]. When dropped, the token is released, including
/// on early returns and unwinding. If release fails during drop, a warning is
/// logged but no panic occurs.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a mut Lock,
}

impl<'a> LockGuard<'a> {
    pub(super) fn new(lock: &'a mut Lock) -> Self {
        Self { lock }
    }

    /// Get the path to the token file.
    pub fn path(&self) -> &Path {
        self.lock.path()
    }

    /// Manually release the lock.
    ///
    /// Use this to release before the guard goes out of scope and to handle
    /// release errors explicitly.
    pub fn release(self) -> Result<()> {
        // Drop still runs afterwards but finds nothing held.
        self.lock.release()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.lock.is_held()
            && let Err(e) = self.lock.release()
        {
            warn!(path = %self.lock.path().display(), "failed to release lock: {}", e);
        }
    }
}
