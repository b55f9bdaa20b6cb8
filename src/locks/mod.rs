//! Inter-process locking through a token file.
//!
//! A [`Lock`] names a path. Whoever manages to create the file at that path
//! holds the lock until they delete it again.
//!
//! # Lock Files
//!
//! Tokens are created using **create_new** semantics (exclusive create), so
//! only one process can create a given token at a time. The parent directory
//! must already exist.
//!
//! # Lock Metadata
//!
//! Each token contains JSON metadata:
//! - `owner`: The owner of the lock (e.g., `user@HOST`)
//! - `host`: The hostname of the owning process
//! - `pid`: The process ID
//! - `created_at`: RFC3339 timestamp
//!
//! # Stale Locks
//!
//! A waiter that finds a token whose recorded process no longer exists on
//! this host removes it and retries. Tokens from other hosts and tokens that
//! cannot be parsed are treated as held by a live owner.
//!
//! # RAII Guards
//!
//! [`Lock::lock`] returns a guard that releases the lock when dropped. If
//! deletion fails during drop, a warning is logged but the program does not
//! crash.

mod guard;
pub mod liveness;
mod metadata;
mod operations;
mod types;


// Re-export public API
pub use guard::LockGuard;
pub use liveness::{Liveness, LivenessProbe, SystemProbe};
pub use metadata::LockMetadata;
pub use types::{Lock, LockInfo};
