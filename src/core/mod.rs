//! Runtime core: monitors and their orchestration.
//!
//! The public API from this module is [`Orchestrator`] (built through
//! [`OrchestratorBuilder`]), the per-parent [`Monitor`], the host-facing
//! [`LifecycleNotification`] and the runtime [`Config`].
//!
//! Internal modules:
//! - [`diff`]: compares a snapshot with the known children of a monitor;
//! - [`pipeline`]: single-subscriber conduit from a scan to the state handler;
//! - [`monitor`]: polling loop and state of one parent process;
//! - [`orchestrator`]: active monitor set, recursion guard, notice fan-out;
//! - [`shutdown`]: cross-platform termination signal handling.

mod builder;
mod config;
mod diff;
mod monitor;
mod notification;
mod orchestrator;
mod pipeline;
mod shutdown;

#[cfg(test)]
mod testkit;

pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use monitor::{Monitor, MonitorParams, MonitorState};
pub use notification::{LifecycleNotification, NotificationKind};
pub use orchestrator::{Orchestrator, StartOutcome};
pub use shutdown::ShutdownSignal;
