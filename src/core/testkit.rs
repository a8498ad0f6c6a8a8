//! Test doubles shared by the monitor and orchestrator tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::error::SnapshotError;
use crate::hooks::ProcessHooks;
use crate::process::{Pid, ProcessDescriptor, ProcessEventKind};
use crate::provider::SnapshotProvider;

pub type Reply = Result<Vec<ProcessDescriptor>, SnapshotError>;

/// Provider that replays scripted replies, then keeps returning the last good snapshot.
///
/// When gated, every call waits for one permit before answering.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Vec<ProcessDescriptor>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub fn gated(script: Vec<Reply>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let provider = Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: Some(Arc::clone(&gate)),
        });
        (provider, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotProvider for ScriptedProvider {
    async fn descendants(&self, _pid: Pid) -> Result<Vec<ProcessDescriptor>, SnapshotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(snapshot)) => {
                *self.fallback.lock() = snapshot.clone();
                Ok(snapshot)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.fallback.lock().clone()),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Shared log written by [`RecordingHooks`].
#[derive(Clone, Default)]
pub struct HookLog {
    pub calls: Arc<Mutex<Vec<(ProcessEventKind, Pid)>>>,
    pub disposed: Arc<AtomicUsize>,
}

impl HookLog {
    pub fn hooks(&self) -> Box<dyn ProcessHooks> {
        Box::new(RecordingHooks { log: self.clone() })
    }

    pub fn calls(&self) -> Vec<(ProcessEventKind, Pid)> {
        self.calls.lock().clone()
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

pub struct RecordingHooks {
    log: HookLog,
}

impl ProcessHooks for RecordingHooks {
    fn on_process_started(&mut self, process: &ProcessDescriptor) {
        self.log
            .calls
            .lock()
            .push((ProcessEventKind::Started, process.pid()));
    }

    fn on_process_terminated(&mut self, process: &ProcessDescriptor) {
        self.log
            .calls
            .lock()
            .push((ProcessEventKind::Terminated, process.pid()));
    }

    fn dispose(&mut self) {
        self.log.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn proc(pid: Pid, parent_pid: Pid, command: &str) -> ProcessDescriptor {
    ProcessDescriptor::new(pid, parent_pid, command)
}

/// Lets spawned tasks run until `cond` holds (bounded number of yields).
pub async fn settle(cond: impl Fn() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
