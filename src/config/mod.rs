//! Configuration model for pidlock.
//!
//! `LockConfig` carries the tunables of a [`Lock`](crate::locks::Lock):
//! how long to wait, how often to poll, and whether dead owners may be
//! reclaimed. It can be built in code or loaded from YAML; unknown fields are
//! ignored for forward compatibility.

mod model;
mod operations;

#[cfg(test)]
mod tests;

pub use model::LockConfig;
pub use model::DEFAULT_POLL_INTERVAL_MS;
