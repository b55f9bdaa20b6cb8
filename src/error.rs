//! Error types for pidlock.
//!
//! Uses thiserror for derive macros. Only `Timeout` is expected during normal
//! contention; the remaining variants report misuse or environment failures.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// The token stayed held by a live owner until the timeout expired.
    #[error("timed out after {}ms waiting for lock '{}'", .waited.as_millis(), .path.display())]
    Timeout { path: PathBuf, waited: Duration },

    /// `release` was called on a handle that does not hold the token.
    #[error("cannot release lock '{}': this handle does not hold it", .path.display())]
    NotOwner { path: PathBuf },

    /// `acquire` was called on a handle that already holds the token.
    #[error("lock '{}' is already held by this handle", .path.display())]
    AlreadyHeld { path: PathBuf },

    /// The token this handle created was removed or replaced by someone else.
    #[error("lock '{}' was broken by another party before release", .path.display())]
    TokenLost { path: PathBuf },

    /// `break_lock` found no token to remove.
    #[error("lock '{}' does not exist", .path.display())]
    NotLocked { path: PathBuf },

    /// Filesystem failure other than contention.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Token metadata could not be serialized or parsed.
    #[error("invalid lock metadata: {0}")]
    Metadata(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl LockError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        LockError::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error is a timeout, i.e. the caller may retry later.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_error_is_recognized() {
        let err = LockError::Timeout {
            path: PathBuf::from("/tmp/x.lock"),
            waited: Duration::from_millis(200),
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "timed out after 200ms waiting for lock '/tmp/x.lock'"
        );
    }

    #[test]
    fn misuse_errors_are_not_timeouts() {
        let err = LockError::NotOwner {
            path: PathBuf::from("a.lock"),
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("does not hold it"));
    }

    #[test]
    fn io_error_keeps_context_and_source() {
        let err = LockError::io(
            "failed to create lock 'a.lock'",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "failed to create lock 'a.lock': denied");
        assert!(std::error::Error::source(&err).is_some());
    }
}
