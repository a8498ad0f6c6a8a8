//! # Debugger attach hooks.
//!
//! [`AttachManager`] turns descendant lifecycle into debugger sessions:
//!
//! ```text
//! on_process_started(p)    ─► AttachPlan::for_process(p) ─► Debugger::attach(plan)
//!                                                              ├─ Ok  → remember session name for p.pid
//!                                                              └─ Err → warn, remember nothing
//! on_process_terminated(p) ─► session for p.pid? ─► Debugger::detach(name), forget it
//! dispose()                ─► detach every remembered session
//! ```
//!
//! The debugger type is chosen from the command name: `dotnet` → `coreclr`,
//! `node` → `node`; anything else gets an empty type and the backend decides.

use std::collections::BTreeMap;

use crate::error::AttachError;
use crate::hooks::ProcessHooks;
use crate::process::{Pid, ProcessDescriptor};

/// Base name given to every attach session.
const SESSION_NAME: &str = ".NET Core Attach - childvisor";

/// Debug adapter family selected for a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebuggerKind {
    /// .NET Core (`dotnet`).
    CoreClr,
    /// Node.js (`node`).
    Node,
    /// No known adapter for the command.
    Unknown,
}

impl DebuggerKind {
    /// Picks the adapter for a command name.
    pub fn for_command(command: &str) -> Self {
        match command {
            "dotnet" => DebuggerKind::CoreClr,
            "node" => DebuggerKind::Node,
            _ => DebuggerKind::Unknown,
        }
    }

    /// Adapter type string understood by debug front-ends (empty when unknown).
    pub fn as_type(&self) -> &'static str {
        match self {
            DebuggerKind::CoreClr => "coreclr",
            DebuggerKind::Node => "node",
            DebuggerKind::Unknown => "",
        }
    }
}

/// Launch configuration for attaching to a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachPlan {
    kind: DebuggerKind,
    name: String,
    process_id: String,
}

impl AttachPlan {
    /// Builds the attach configuration for a descendant.
    ///
    /// # Example
    /// ```
    /// use childvisor::{AttachPlan, ProcessDescriptor};
    ///
    /// let plan = AttachPlan::for_process(&ProcessDescriptor::new(4250, 4242, "dotnet"));
    /// assert_eq!(plan.adapter_type(), "coreclr");
    /// assert_eq!(plan.request(), "attach");
    /// assert_eq!(plan.process_id(), "4250");
    /// assert_eq!(plan.name(), ".NET Core Attach - childvisor - [4250]");
    /// ```
    pub fn for_process(process: &ProcessDescriptor) -> Self {
        let process_id = process.pid().to_string();
        Self {
            kind: DebuggerKind::for_command(process.command()),
            name: format!("{SESSION_NAME} - [{process_id}]"),
            process_id,
        }
    }

    /// Adapter family.
    pub fn kind(&self) -> DebuggerKind {
        self.kind
    }

    /// Adapter type string.
    pub fn adapter_type(&self) -> &'static str {
        self.kind.as_type()
    }

    /// Request type; always `attach`.
    pub fn request(&self) -> &'static str {
        "attach"
    }

    /// Session name, unique per pid.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target process id, as a string.
    pub fn process_id(&self) -> &str {
        &self.process_id
    }
}

/// Backend that starts and stops debug sessions.
pub trait Debugger: Send + 'static {
    /// Starts a session described by `plan`.
    fn attach(&mut self, plan: &AttachPlan) -> Result<(), AttachError>;

    /// Disconnects the session named `session`.
    fn detach(&mut self, session: &str);
}

/// [`ProcessHooks`] that keeps one debug session per live descendant.
pub struct AttachManager<D> {
    debugger: D,
    sessions: BTreeMap<Pid, String>,
}

impl<D: Debugger> AttachManager<D> {
    /// Creates a manager driving `debugger`.
    pub fn new(debugger: D) -> Self {
        Self {
            debugger,
            sessions: BTreeMap::new(),
        }
    }

    /// Pids that currently have a session.
    pub fn attached(&self) -> impl Iterator<Item = Pid> + '_ {
        self.sessions.keys().copied()
    }

    /// Access to the backend.
    pub fn debugger(&self) -> &D {
        &self.debugger
    }
}

impl<D: Debugger> ProcessHooks for AttachManager<D> {
    fn on_process_started(&mut self, process: &ProcessDescriptor) {
        let plan = AttachPlan::for_process(process);
        match self.debugger.attach(&plan) {
            Ok(()) => {
                tracing::info!(pid = process.pid(), session = plan.name(), "attached debugger");
                self.sessions.insert(process.pid(), plan.name().to_string());
            }
            Err(e) => {
                tracing::warn!(pid = process.pid(), label = e.as_label(), error = %e, "attach failed");
            }
        }
    }

    fn on_process_terminated(&mut self, process: &ProcessDescriptor) {
        let Some(session) = self.sessions.remove(&process.pid()) else {
            return;
        };
        tracing::info!(pid = process.pid(), %session, "detaching debugger from exited process");
        self.debugger.detach(&session);
    }

    fn dispose(&mut self) {
        for (pid, session) in std::mem::take(&mut self.sessions) {
            tracing::debug!(pid, %session, "detaching debugger on dispose");
            self.debugger.detach(&session);
        }
    }
}
