//! # Runtime notices emitted by monitors and the orchestrator.
//!
//! The [`EventKind`] enum classifies notices across four groups:
//! - **Monitor lifecycle**: started, stopped, stopped twice
//! - **Scans**: skipped because one is in flight, failed in the provider
//! - **Descendants**: a child process started or terminated
//! - **Orchestration**: refusals (recursion, duplicates, missing pid) and shutdown
//!
//! The [`Event`] struct carries the metadata: timestamp, session, parent pid, child
//! pid/command, and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each notice has a globally unique sequence number (`seq`) that increases
//! monotonically.
//!
//! ## Example
//! ```rust
//! use childvisor::{Event, EventKind, ParentDescriptor, ProcessDescriptor};
//!
//! let parent = ParentDescriptor::new("session-1", 100);
//! let child = ProcessDescriptor::new(101, 100, "node");
//! let ev = Event::new(EventKind::ProcessStarted)
//!     .with_parent(&parent)
//!     .with_process(&child);
//!
//! assert_eq!(ev.session.as_deref(), Some("session-1"));
//! assert_eq!(ev.pid, Some(101));
//! assert_eq!(ev.command.as_deref(), Some("node"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::process::{ParentDescriptor, Pid, ProcessDescriptor};

/// Global sequence counter for notice ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked while handling a notice.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped a notice (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Orchestration ===
    /// Termination signal observed by `Orchestrator::serve`.
    ShutdownRequested,

    /// A process was reported as a parent while it is already a tracked descendant.
    ///
    /// Sets:
    /// - `session`, `parent_pid`: the refused parent
    RecursionRefused,

    /// A monitor for the same parent is already active.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    AlreadyMonitored,

    /// A lifecycle notification arrived without a pid.
    ///
    /// Sets:
    /// - `session`
    MissingPid,

    // === Monitor lifecycle ===
    /// Monitor started polling its parent.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    MonitorStarted,

    /// Monitor stopped polling.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    MonitorStopped,

    /// `stop` was called on a monitor that was not running.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    MonitorAlreadyStopped,

    // === Scans ===
    /// A tick fired while the previous scan was still in flight.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    ScanSkipped,

    /// The snapshot provider failed; the tick was aborted.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    /// - `reason`: provider error message
    ScanFailed,

    // === Descendants ===
    /// A descendant appeared.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    /// - `pid`, `command`: the descendant
    ProcessStarted,

    /// A known descendant disappeared.
    ///
    /// Sets:
    /// - `session`, `parent_pid`
    /// - `pid`, `command`: the descendant
    ProcessTerminated,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
            EventKind::ShutdownRequested => "shutdown-requested",
            EventKind::RecursionRefused => "recursion-refused",
            EventKind::AlreadyMonitored => "already-monitored",
            EventKind::MissingPid => "missing-pid",
            EventKind::MonitorStarted => "monitor-started",
            EventKind::MonitorStopped => "monitor-stopped",
            EventKind::MonitorAlreadyStopped => "monitor-already-stopped",
            EventKind::ScanSkipped => "scan-skipped",
            EventKind::ScanFailed => "scan-failed",
            EventKind::ProcessStarted => "process-started",
            EventKind::ProcessTerminated => "process-terminated",
        }
    }
}

/// Runtime notice with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notice classification.
    pub kind: EventKind,

    /// Session that owns the parent, if applicable.
    pub session: Option<Arc<str>>,
    /// Tracked parent pid, if applicable.
    pub parent_pid: Option<Pid>,
    /// Descendant pid, if applicable.
    pub pid: Option<Pid>,
    /// Descendant command, if applicable.
    pub command: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Name of the subscriber that caused the notice.
    pub source: Option<Arc<str>>,
}

impl Event {
    /// Creates a new notice of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            session: None,
            parent_pid: None,
            pid: None,
            command: None,
            reason: None,
            source: None,
        }
    }

    /// Attaches the tracked parent (session and pid).
    #[inline]
    pub fn with_parent(mut self, parent: &ParentDescriptor) -> Self {
        self.session = Some(Arc::from(parent.session_id()));
        self.parent_pid = Some(parent.pid());
        self
    }

    /// Attaches a session id alone.
    #[inline]
    pub fn with_session(mut self, session: impl Into<Arc<str>>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Attaches a parent pid alone.
    #[inline]
    pub fn with_parent_pid(mut self, pid: Pid) -> Self {
        self.parent_pid = Some(pid);
        self
    }

    /// Attaches a descendant (pid and command).
    #[inline]
    pub fn with_process(mut self, process: &ProcessDescriptor) -> Self {
        self.pid = Some(process.pid());
        self.command = Some(Arc::from(process.command()));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow notice.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.source = Some(Arc::from(subscriber));
        ev
    }

    /// Creates a subscriber panic notice.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.source = Some(Arc::from(subscriber));
        ev
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panicked(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
