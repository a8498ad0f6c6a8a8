//! # Host lifecycle notifications.
//!
//! The host environment reports debug sessions through [`LifecycleNotification`]s. Only
//! two kinds matter to the orchestrator: a session's top-level process appeared, or the
//! session ended. Everything else is carried as [`NotificationKind::Other`] and ignored.

use std::sync::Arc;

use crate::process::Pid;

/// What a lifecycle notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A session's process was observed; its pid becomes a parent to monitor.
    ProcessStarted,
    /// A session ended; every monitor of that session is torn down.
    ProcessExited,
    /// Any other host notification.
    Other,
}

impl NotificationKind {
    /// Maps a host event name: `"process"` and `"exited"` are recognized.
    ///
    /// ```
    /// use childvisor::NotificationKind;
    ///
    /// assert_eq!(NotificationKind::from_name("process"), NotificationKind::ProcessStarted);
    /// assert_eq!(NotificationKind::from_name("exited"), NotificationKind::ProcessExited);
    /// assert_eq!(NotificationKind::from_name("output"), NotificationKind::Other);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name {
            "process" => NotificationKind::ProcessStarted,
            "exited" => NotificationKind::ProcessExited,
            _ => NotificationKind::Other,
        }
    }

    /// Returns a short stable label for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            NotificationKind::ProcessStarted => "process-started",
            NotificationKind::ProcessExited => "process-exited",
            NotificationKind::Other => "other",
        }
    }
}

/// A notification delivered by the host about one debug session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleNotification {
    /// Notification kind.
    pub kind: NotificationKind,
    /// Session the notification belongs to.
    pub session_id: Arc<str>,
    /// Reported process id; hosts may omit it.
    pub pid: Option<Pid>,
}

impl LifecycleNotification {
    /// A session's process was observed.
    pub fn process_started(session_id: impl Into<Arc<str>>, pid: Option<Pid>) -> Self {
        Self {
            kind: NotificationKind::ProcessStarted,
            session_id: session_id.into(),
            pid,
        }
    }

    /// A session ended.
    pub fn process_exited(session_id: impl Into<Arc<str>>) -> Self {
        Self {
            kind: NotificationKind::ProcessExited,
            session_id: session_id.into(),
            pid: None,
        }
    }

    /// Any other notification.
    pub fn other(session_id: impl Into<Arc<str>>) -> Self {
        Self {
            kind: NotificationKind::Other,
            session_id: session_id.into(),
            pid: None,
        }
    }
}
