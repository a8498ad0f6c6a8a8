//! # Consumer hooks.
//!
//! Hooks are the side-effecting end of a monitor: every applied start/terminate event
//! is forwarded to exactly one [`ProcessHooks`] instance, owned by that monitor alone.
//!
//! - [`ProcessHooks`] - callbacks invoked per descendant
//! - [`HookFactory`] - builds a fresh hooks instance for each new monitor
//! - [`AttachManager`], [`AttachPlan`], [`Debugger`] - hooks that attach a debugger to
//!   every descendant and detach when it exits

mod attach;
mod hook;

pub use attach::{AttachManager, AttachPlan, Debugger, DebuggerKind};
pub use hook::{HookFactory, ProcessHooks};
