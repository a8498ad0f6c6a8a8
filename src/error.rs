//! Error types used by monitors, snapshot providers and hooks.
//!
//! - [`MonitorError`]: lifecycle misuse of a [`Monitor`](crate::Monitor), the only
//!   errors that reach the caller of the orchestration API.
//! - [`SnapshotError`]: a snapshot provider failed; contained inside the tick that saw it.
//! - [`PipelineError`]: misuse of a monitor's event pipeline.
//! - [`AttachError`]: a debugger backend refused to attach.
//!
//! Every enum provides `as_label` (stable snake_case, for logs) and `as_message`.

use thiserror::Error;

use crate::process::{ParentDescriptor, Pid};

/// # Errors produced by monitor lifecycle calls.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// `start` was called on a monitor that is already running.
    #[error("monitor already started for process {parent}")]
    AlreadyRunning {
        /// Parent tracked by the monitor.
        parent: ParentDescriptor,
    },

    /// `start` was called on a monitor that has been stopped.
    #[error("monitor for process {parent} was stopped and cannot be restarted")]
    Finished {
        /// Parent tracked by the monitor.
        parent: ParentDescriptor,
    },

    /// The monitor's event pipeline refused the state handler.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl MonitorError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use childvisor::{MonitorError, ParentDescriptor};
    ///
    /// let err = MonitorError::AlreadyRunning { parent: ParentDescriptor::new("s1", 7) };
    /// assert_eq!(err.as_label(), "monitor_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MonitorError::AlreadyRunning { .. } => "monitor_already_running",
            MonitorError::Finished { .. } => "monitor_finished",
            MonitorError::Pipeline(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            MonitorError::AlreadyRunning { parent } => {
                format!("already running: pid={} session={}", parent.pid(), parent.session_id())
            }
            MonitorError::Finished { parent } => {
                format!("finished: pid={} session={}", parent.pid(), parent.session_id())
            }
            MonitorError::Pipeline(e) => format!("pipeline: {e}"),
        }
    }
}

/// # Errors produced by snapshot providers.
///
/// None of these is fatal: the tick that observes one is aborted and the next tick
/// requests a fresh snapshot.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Reading the process table failed.
    #[error("process table read failed: {0}")]
    Io(#[from] std::io::Error),

    /// Any other provider failure.
    #[error("snapshot failed: {reason}")]
    Failed {
        /// The underlying error message.
        reason: String,
    },
}

impl SnapshotError {
    /// Convenience constructor for [`SnapshotError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        SnapshotError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use childvisor::SnapshotError;
    ///
    /// assert_eq!(SnapshotError::failed("boom").as_label(), "snapshot_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SnapshotError::Io(_) => "snapshot_io",
            SnapshotError::Failed { .. } => "snapshot_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SnapshotError::Io(e) => format!("io: {e}"),
            SnapshotError::Failed { reason } => format!("error: {reason}"),
        }
    }
}

/// # Errors produced by the per-monitor event pipeline.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// A handler is already subscribed; the pipeline accepts exactly one.
    #[error("event pipeline already has a subscriber")]
    AlreadySubscribed,

    /// The pipeline was completed before the subscription.
    #[error("event pipeline is completed")]
    Completed,
}

impl PipelineError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PipelineError::AlreadySubscribed => "pipeline_already_subscribed",
            PipelineError::Completed => "pipeline_completed",
        }
    }
}

/// # Errors produced by debugger backends.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// The backend refused to start a session for the process.
    #[error("debugger refused to attach to pid {pid}: {reason}")]
    Rejected {
        /// Target process.
        pid: Pid,
        /// Backend-provided reason.
        reason: String,
    },
}

impl AttachError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AttachError::Rejected { .. } => "attach_rejected",
        }
    }
}
