//! # Hook traits.
//!
//! A [`ProcessHooks`] value receives, for one monitor:
//! - `on_process_started` exactly once per pid, after the pid entered the known set;
//! - `on_process_terminated` at most once per pid that was started, after removal;
//! - `dispose` once, when the monitor is disposed.
//!
//! Hooks run synchronously on the scan path of their monitor, so they should hand slow
//! work off (spawn, channel) instead of blocking.
//!
//! They run while their monitor's pipeline and hooks locks are held. A hook must not call
//! back into the [`Orchestrator`](crate::Orchestrator) or its own [`Monitor`](crate::Monitor)
//! synchronously: `stop`, `session_ended` or `dispose` for its own session would wait on
//! those locks forever. Send such requests through a channel instead.
//!
//! ## Example
//! ```rust
//! use childvisor::{HookFactory, ParentDescriptor, ProcessDescriptor, ProcessHooks};
//!
//! struct Print;
//!
//! impl ProcessHooks for Print {
//!     fn on_process_started(&mut self, p: &ProcessDescriptor) { println!("+ {p}"); }
//!     fn on_process_terminated(&mut self, p: &ProcessDescriptor) { println!("- {p}"); }
//! }
//!
//! let factory = |_parent: &ParentDescriptor| Box::new(Print) as Box<dyn ProcessHooks>;
//! let _hooks = factory.create(&ParentDescriptor::new("s", 1));
//! ```

use crate::process::{ParentDescriptor, ProcessDescriptor};

/// Callbacks invoked for descendant processes of one monitored parent.
pub trait ProcessHooks: Send + 'static {
    /// A descendant appeared.
    fn on_process_started(&mut self, process: &ProcessDescriptor);

    /// A previously started descendant disappeared.
    fn on_process_terminated(&mut self, process: &ProcessDescriptor);

    /// Releases whatever the hooks still hold. Called once.
    fn dispose(&mut self) {}
}

/// Builds one hooks instance per monitor.
///
/// Hooks are never shared between monitors; the factory is asked for a new one each
/// time the orchestrator starts monitoring a parent.
pub trait HookFactory: Send + Sync + 'static {
    /// Creates hooks for the monitor of `parent`.
    fn create(&self, parent: &ParentDescriptor) -> Box<dyn ProcessHooks>;
}

impl<F> HookFactory for F
where
    F: Fn(&ParentDescriptor) -> Box<dyn ProcessHooks> + Send + Sync + 'static,
{
    fn create(&self, parent: &ParentDescriptor) -> Box<dyn ProcessHooks> {
        self(parent)
    }
}
