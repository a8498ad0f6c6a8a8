//! # childvisor
//!
//! **Childvisor** watches the descendant processes of supervised parent processes and
//! tells you when each one starts or exits.
//!
//! A host (typically a debugger front-end) reports the top-level process of each debug
//! session. For every such parent the [`Orchestrator`] runs one [`Monitor`] that polls a
//! [`SnapshotProvider`] on a fixed interval, diffs the snapshot against the children it
//! already knows, and forwards every change to that monitor's [`ProcessHooks`], for
//! instance an [`AttachManager`] that attaches a debugger to each new child.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   LifecycleNotification (host)   ── "process" / "exited" per session
//!              │
//!              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - active monitors by ParentDescriptor (session, pid)             │
//! │  - recursion guard: known children never become parents           │
//! │  - Bus (broadcast notices) ──► SubscriberSet (per-sub queues)     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌───────────┐      ┌───────────┐      ┌───────────┐
//!   │  Monitor  │      │  Monitor  │      │  Monitor  │
//!   │ (ticker)  │      │ (ticker)  │      │ (ticker)  │
//!   └─────┬─────┘      └─────┬─────┘      └─────┬─────┘
//!         │ every scan_interval, at most one scan in flight
//!         ▼
//!   SnapshotProvider::descendants(parent pid)
//!         │
//!         ▼
//!   diff vs. known children ──► EventPipeline ──► state handler
//!                                                  ├─ update known children
//!                                                  ├─ ProcessHooks (exclusive)
//!                                                  └─ notice on the Bus
//! ```
//!
//! ### Monitor lifecycle
//! ```text
//! Idle ──start()──► Running ──stop()──► Stopped
//!                     │  start() again → MonitorError::AlreadyRunning
//!                     ▼
//!               dispose(): stop if running, dispose hooks once
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Orchestration** | One monitor per parent, recursion guard, host dispatch.  | [`Orchestrator`], [`LifecycleNotification`] |
//! | **Monitoring**    | Periodic scans, skip-when-busy, start/terminate diffing. | [`Monitor`], [`MonitorParams`]              |
//! | **Providers**     | Where snapshots come from.                               | [`SnapshotProvider`], [`SysinfoProvider`]   |
//! | **Hooks**         | React to descendants, attach debuggers.                  | [`ProcessHooks`], [`AttachManager`]         |
//! | **Notices**       | Observe what the runtime does.                           | [`Subscribe`], [`Event`], [`EventKind`]     |
//! | **Errors**        | Typed errors with stable labels.                         | [`MonitorError`], [`SnapshotError`]         |
//! | **Configuration** | Centralize runtime settings.                             | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use childvisor::{
//!     LifecycleNotification, Orchestrator, ParentDescriptor, Pid, ProcessDescriptor,
//!     ProcessHooks, ProviderFn, SnapshotError, StartOutcome,
//! };
//!
//! struct Print;
//!
//! impl ProcessHooks for Print {
//!     fn on_process_started(&mut self, p: &ProcessDescriptor) { println!("+ {p}"); }
//!     fn on_process_terminated(&mut self, p: &ProcessDescriptor) { println!("- {p}"); }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ProviderFn::arc("static", |pid: Pid| async move {
//!         Ok::<_, SnapshotError>(vec![ProcessDescriptor::new(pid + 1, pid, "dotnet")])
//!     });
//!     let orch = Orchestrator::builder(provider, |_p: &ParentDescriptor| {
//!         Box::new(Print) as Box<dyn ProcessHooks>
//!     })
//!     .build();
//!
//!     let outcome = orch.start(&LifecycleNotification::process_started("session-1", Some(4242)))?;
//!     assert_eq!(outcome, StartOutcome::Started);
//!
//!     orch.stop(&LifecycleNotification::process_exited("session-1"));
//!     assert!(orch.is_empty());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod hooks;
mod process;
mod provider;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    Config, LifecycleNotification, Monitor, MonitorParams, MonitorState, NotificationKind,
    Orchestrator, OrchestratorBuilder, ShutdownSignal, StartOutcome,
};
pub use error::{AttachError, MonitorError, PipelineError, SnapshotError};
pub use events::{Bus, Event, EventKind};
pub use hooks::{AttachManager, AttachPlan, Debugger, DebuggerKind, HookFactory, ProcessHooks};
pub use process::{ParentDescriptor, Pid, ProcessDescriptor, ProcessEvent, ProcessEventKind};
pub use provider::{ProviderFn, ProviderRef, SnapshotProvider, SysinfoProvider};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: built-in subscriber that renders notices through `tracing`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
