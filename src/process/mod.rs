//! Process descriptors and the events derived from them.
//!
//! ## Contents
//! - [`ProcessDescriptor`] one observed process (pid, parent pid, command)
//! - [`ParentDescriptor`] the tracked parent of a monitor (session id, pid)
//! - [`ProcessEvent`], [`ProcessEventKind`] start/terminate events produced by a scan
//! - [`Pid`] process identifier alias

mod descriptor;
mod event;

pub use descriptor::{ParentDescriptor, Pid, ProcessDescriptor};
pub use event::{ProcessEvent, ProcessEventKind};
