//! pidlock: inter-process mutual exclusion through a token file.
//!
//! Cooperating processes serialize access to a shared resource by racing to
//! create one file. The winner writes its process identity into it and
//! deletes it when done; losers poll until the file is gone, their timeout
//! expires, or they find that the recorded owner has died.
//!
//! ```no_run
//! use pidlock::Lock;
//! use std::time::Duration;
//!
//! let mut lock = Lock::with_timeout("/tmp/resource.lock", Duration::from_secs(5));
//! {
//!     let _guard = lock.lock()?;
//!     // critical section
//! }
//! assert!(!lock.is_locked());
//! # Ok::<(), pidlock::LockError>(())
//! ```

pub mod config;
pub mod error;
pub mod locks;

pub use config::LockConfig;
pub use error::{LockError, Result};
pub use locks::{Liveness, LivenessProbe, Lock, LockGuard, LockInfo, LockMetadata, SystemProbe};
