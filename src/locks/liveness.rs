//! Process liveness probing.
//!
//! A token records the pid of its creator. Before a waiter removes a token it
//! asks a [`LivenessProbe`] whether that pid still exists. Only a definite
//! [`Liveness::Dead`] allows reclamation; anything the probe cannot decide is
//! treated as a live owner.

use std::fmt;

/// Result of probing a process id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// The process exists.
    Alive,
    /// The process table has no entry for the pid.
    Dead,
    /// The probe could not tell (foreign host, unsupported platform, odd pid).
    Unknown,
}

impl Liveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Liveness::Alive => "alive",
            Liveness::Dead => "dead",
            Liveness::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability to ask the host whether a process is running.
pub trait LivenessProbe: Send + Sync + fmt::Debug {
    /// Probe the process with the given id on this host.
    fn check(&self, pid: u32) -> Liveness;
}

/// Probe backed by the operating system's process table.
///
/// On unix this sends signal 0, which performs the existence and permission
/// checks of `kill(2)` without delivering anything. On Linux a process that
/// answers but is a zombie in `/proc/<pid>/stat` counts as dead. Other
/// platforms always report [`Liveness::Unknown`], so tokens are never
/// reclaimed there.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl LivenessProbe for SystemProbe {
    #[cfg(unix)]
    fn check(&self, pid: u32) -> Liveness {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        // pid 0 and negative values address process groups.
        let raw = match i32::try_from(pid) {
            Ok(raw) if raw > 0 => raw,
            _ => return Liveness::Unknown,
        };

        match kill(Pid::from_raw(raw), None) {
            Ok(()) if is_zombie(pid) => Liveness::Dead,
            Ok(()) => Liveness::Alive,
            Err(Errno::ESRCH) => Liveness::Dead,
            // Exists, but owned by another user.
            Err(Errno::EPERM) => Liveness::Alive,
            Err(_) => Liveness::Unknown,
        }
    }

    #[cfg(not(unix))]
    fn check(&self, _pid: u32) -> Liveness {
        Liveness::Unknown
    }
}

/// Whether the process has exited but not been reaped by its parent yet.
///
/// Signal 0 still succeeds for such a process, yet it will never release
/// anything again.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| process_state(&stat))
        .is_some_and(|state| matches!(state, 'Z' | 'X'))
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: u32) -> bool {
    false
}

/// State letter from a `/proc/<pid>/stat` line.
///
/// The command name is wrapped in parentheses and may itself contain them,
/// so the state is the first field after the last `)`.
#[cfg(any(target_os = "linux", test))]
pub(crate) fn process_state(stat: &str) -> Option<char> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().next()?.chars().next()
}
