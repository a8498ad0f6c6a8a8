//! # Process events produced by the diff step.
//!
//! A [`ProcessEvent`] pairs a [`ProcessEventKind`] with the descriptor it concerns.
//! Events are values: created once by the diff and consumed by the pipeline handler.

use super::descriptor::{Pid, ProcessDescriptor};

/// Whether a descendant appeared or disappeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessEventKind {
    /// The pid is present in the snapshot but was not known before the tick.
    Started,
    /// The pid was known before the tick but is missing from the snapshot.
    Terminated,
}

impl ProcessEventKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessEventKind::Started => "process_started",
            ProcessEventKind::Terminated => "process_terminated",
        }
    }
}

/// A start or terminate event for one descendant process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEvent {
    kind: ProcessEventKind,
    descriptor: ProcessDescriptor,
}

impl ProcessEvent {
    /// Creates a `Started` event.
    #[inline]
    pub fn started(descriptor: ProcessDescriptor) -> Self {
        Self {
            kind: ProcessEventKind::Started,
            descriptor,
        }
    }

    /// Creates a `Terminated` event.
    #[inline]
    pub fn terminated(descriptor: ProcessDescriptor) -> Self {
        Self {
            kind: ProcessEventKind::Terminated,
            descriptor,
        }
    }

    /// Event classification.
    #[inline]
    pub fn kind(&self) -> ProcessEventKind {
        self.kind
    }

    /// The process the event is about.
    #[inline]
    pub fn descriptor(&self) -> &ProcessDescriptor {
        &self.descriptor
    }

    /// Shorthand for `descriptor().pid()`.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.descriptor.pid()
    }
}
