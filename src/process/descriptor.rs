//! # Immutable process descriptors.
//!
//! [`ProcessDescriptor`] describes one process seen in a snapshot. Its identity is the
//! pid alone: two descriptors for the same pid are the same process, even if the command
//! or parent pid was reread differently by a later scan.
//!
//! [`ParentDescriptor`] identifies what a [`Monitor`](crate::Monitor) tracks: the
//! external session that reported the parent, and the parent's pid.

use std::fmt;
use std::sync::Arc;

/// Operating system process identifier.
pub type Pid = u32;

/// Snapshot of a single process: pid, parent pid and command name.
///
/// Cheap to clone (the command is shared).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProcessDescriptor {
    pid: Pid,
    parent_pid: Pid,
    command: Arc<str>,
}

impl ProcessDescriptor {
    /// Creates a new descriptor.
    pub fn new(pid: Pid, parent_pid: Pid, command: impl Into<Arc<str>>) -> Self {
        Self {
            pid,
            parent_pid,
            command: command.into(),
        }
    }

    /// Process identifier (identity key).
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Identifier of the direct parent process.
    #[inline]
    pub fn parent_pid(&self) -> Pid {
        self.parent_pid
    }

    /// Command name, as reported by the snapshot provider.
    #[inline]
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl fmt::Display for ProcessDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] (parent {})",
            self.command, self.pid, self.parent_pid
        )
    }
}

/// Identifies the parent process tracked by one monitor.
///
/// Set once when the monitor is built and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParentDescriptor {
    session_id: Arc<str>,
    pid: Pid,
}

impl ParentDescriptor {
    /// Creates a new parent descriptor.
    pub fn new(session_id: impl Into<Arc<str>>, pid: Pid) -> Self {
        Self {
            session_id: session_id.into(),
            pid,
        }
    }

    /// Identifier of the external session that owns the parent.
    #[inline]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Parent process identifier.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl fmt::Display for ParentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] session={}", self.pid, self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_accessors() {
        let d = ProcessDescriptor::new(10, 1, "dotnet");
        assert_eq!(d.pid(), 10);
        assert_eq!(d.parent_pid(), 1);
        assert_eq!(d.command(), "dotnet");
        assert_eq!(d.to_string(), "dotnet [10] (parent 1)");
    }

    #[test]
    fn parent_equality_uses_session_and_pid() {
        let a = ParentDescriptor::new("s1", 42);
        assert_eq!(a, ParentDescriptor::new("s1", 42));
        assert_ne!(a, ParentDescriptor::new("s2", 42));
        assert_ne!(a, ParentDescriptor::new("s1", 43));
    }
}
