//! # Orchestrator: one monitor per debugged parent process.
//!
//! The [`Orchestrator`] turns host [`LifecycleNotification`]s into monitors. It owns the
//! notice [`Bus`], the [`SubscriberSet`] fed from it, the shared snapshot provider and the
//! [`HookFactory`] that equips every new monitor with its own hooks.
//!
//! ## Architecture
//! ```text
//! LifecycleNotification ──► handle()
//!   ├─ ProcessStarted ──► start()
//!   │     ├─ pid missing              → MissingPid        (notice, no monitor)
//!   │     ├─ pid is a known child     → RecursionRefused  (notice, no monitor)
//!   │     ├─ same parent monitored    → AlreadyMonitored  (notice, no monitor)
//!   │     └─ Monitor::new(parent, provider, factory.create(parent)) ─► start()
//!   ├─ ProcessExited ──► stop(): stop + dispose every monitor of the session
//!   └─ Other ──► ignored
//!
//! Notices:
//!   Monitor / Orchestrator ── publish ──► Bus ──► listener ──► SubscriberSet::emit
//!
//! serve(rx):
//!   loop { rx.recv() → handle() } until rx closes or a termination signal arrives
//!   └─► dispose() ─► drain subscribers (bounded by Config::grace)
//! ```
//!
//! ## Rules
//! - A pid that is a known descendant of any active monitor never becomes a parent.
//! - Monitors of other sessions are never touched by `stop`.
//! - `dispose` is idempotent.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::builder::OrchestratorBuilder;
use crate::core::monitor::{Monitor, MonitorParams};
use crate::core::notification::{LifecycleNotification, NotificationKind};
use crate::core::{Config, shutdown};
use crate::error::MonitorError;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::HookFactory;
use crate::process::{ParentDescriptor, Pid, ProcessDescriptor};
use crate::provider::ProviderRef;
use crate::subscribers::SubscriberSet;

/// Result of a start request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new monitor was created and started.
    Started,
    /// The pid is already a descendant of a monitored parent.
    RecursionRefused,
    /// A monitor for the same session and pid already exists.
    AlreadyMonitored,
    /// The notification carried no pid.
    MissingPid,
}

impl StartOutcome {
    /// Returns a short stable label for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartOutcome::Started => "started",
            StartOutcome::RecursionRefused => "recursion-refused",
            StartOutcome::AlreadyMonitored => "already-monitored",
            StartOutcome::MissingPid => "missing-pid",
        }
    }
}

/// Bus-to-subscribers forwarding task.
pub(crate) struct Listener {
    cancel: CancellationToken,
    join: JoinHandle<SubscriberSet>,
}

impl Listener {
    /// Spawns the forwarding loop. Must be called inside a tokio runtime.
    pub(crate) fn spawn(bus: &Bus, set: SubscriberSet) -> Self {
        let cancel = CancellationToken::new();
        let join = tokio::spawn(forward(bus.subscribe(), set, cancel.clone()));
        Self { cancel, join }
    }
}

async fn forward(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    cancel: CancellationToken,
) -> SubscriberSet {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Ok(ev) => set.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => return set,
            },
        }
    }
    loop {
        match rx.try_recv() {
            Ok(ev) => set.emit(&ev),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    set
}

/// Creates, tracks and tears down monitors in response to host notifications.
pub struct Orchestrator {
    cfg: Config,
    bus: Bus,
    provider: ProviderRef,
    hooks: Box<dyn HookFactory>,
    monitors: Mutex<HashMap<ParentDescriptor, Monitor>>,
    listener: Mutex<Option<Listener>>,
}

impl Orchestrator {
    /// Starts building an orchestrator around a snapshot provider and a hook factory.
    pub fn builder(provider: ProviderRef, hooks: impl HookFactory) -> OrchestratorBuilder {
        OrchestratorBuilder::new(provider, hooks)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        provider: ProviderRef,
        hooks: Box<dyn HookFactory>,
        listener: Option<Listener>,
    ) -> Self {
        Self {
            cfg,
            bus,
            provider,
            hooks,
            monitors: Mutex::new(HashMap::new()),
            listener: Mutex::new(listener),
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Subscribes to runtime notices directly.
    pub fn notices(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Starts monitoring the process reported by `notification`.
    ///
    /// # Errors
    /// Propagates [`MonitorError`] from [`Monitor::start`].
    pub fn start(&self, notification: &LifecycleNotification) -> Result<StartOutcome, MonitorError> {
        self.process_observed(&notification.session_id, notification.pid)
    }

    /// Starts monitoring `pid` as the parent process of `session_id`.
    ///
    /// Refusals (missing pid, recursion, duplicate) are reported as [`StartOutcome`]
    /// variants plus a notice; the active set is left unchanged.
    ///
    /// # Errors
    /// Propagates [`MonitorError`] from [`Monitor::start`].
    pub fn process_observed(
        &self,
        session_id: &str,
        pid: Option<Pid>,
    ) -> Result<StartOutcome, MonitorError> {
        let Some(pid) = pid else {
            tracing::warn!(session = session_id, "process notification without pid; ignoring");
            self.bus
                .publish(Event::new(EventKind::MissingPid).with_session(session_id));
            return Ok(StartOutcome::MissingPid);
        };
        let parent = ParentDescriptor::new(session_id, pid);

        let mut monitors = self.monitors.lock();
        if monitors.values().any(|m| m.is_tracking(pid)) {
            tracing::info!(pid, session = session_id, "process is already monitored as a child; not monitoring it as a parent");
            self.bus
                .publish(Event::new(EventKind::RecursionRefused).with_parent(&parent));
            return Ok(StartOutcome::RecursionRefused);
        }
        if monitors.contains_key(&parent) {
            tracing::info!(pid, session = session_id, "process is already monitored");
            self.bus
                .publish(Event::new(EventKind::AlreadyMonitored).with_parent(&parent));
            return Ok(StartOutcome::AlreadyMonitored);
        }

        let monitor = Monitor::new(
            parent.clone(),
            Arc::clone(&self.provider),
            self.hooks.create(&parent),
            MonitorParams::from(&self.cfg),
            self.bus.clone(),
        );
        if let Err(e) = monitor.start() {
            monitor.dispose();
            return Err(e);
        }
        monitors.insert(parent, monitor);
        Ok(StartOutcome::Started)
    }

    /// Stops every monitor of the session named by `notification`.
    ///
    /// Returns the number of monitors removed.
    pub fn stop(&self, notification: &LifecycleNotification) -> usize {
        self.session_ended(&notification.session_id)
    }

    /// Stops and disposes every monitor whose session id is `session_id`.
    ///
    /// Returns the number of monitors removed.
    pub fn session_ended(&self, session_id: &str) -> usize {
        let removed: Vec<Monitor> = {
            let mut monitors = self.monitors.lock();
            let keys: Vec<ParentDescriptor> = monitors
                .keys()
                .filter(|p| p.session_id() == session_id)
                .cloned()
                .collect();
            keys.iter().filter_map(|k| monitors.remove(k)).collect()
        };
        for monitor in &removed {
            monitor.dispose();
        }
        if !removed.is_empty() {
            tracing::info!(session = session_id, monitors = removed.len(), "session ended; monitors removed");
        }
        removed.len()
    }

    /// Dispatches one notification: started → [`start`](Self::start), exited →
    /// [`stop`](Self::stop), anything else is ignored.
    ///
    /// # Errors
    /// Propagates [`MonitorError`] from [`start`](Self::start).
    pub fn handle(&self, notification: &LifecycleNotification) -> Result<(), MonitorError> {
        tracing::trace!(kind = notification.kind.as_label(), session = &*notification.session_id, "lifecycle notification");
        match notification.kind {
            NotificationKind::ProcessStarted => self.start(notification).map(|_| ()),
            NotificationKind::ProcessExited => {
                self.stop(notification);
                Ok(())
            }
            NotificationKind::Other => Ok(()),
        }
    }

    /// Drives [`handle`](Self::handle) from `rx` until the channel closes or a termination
    /// signal arrives, then shuts down.
    pub async fn serve(&self, mut rx: mpsc::Receiver<LifecycleNotification>) {
        let signal = async {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(sig) => sig,
                Err(e) => {
                    tracing::warn!(error = %e, "termination signals unavailable; serving until the channel closes");
                    std::future::pending().await
                }
            }
        };
        tokio::pin!(signal);

        loop {
            tokio::select! {
                sig = &mut signal => {
                    tracing::info!(signal = sig.as_label(), "termination signal received");
                    self.bus.publish(Event::new(EventKind::ShutdownRequested));
                    break;
                }
                msg = rx.recv() => match msg {
                    Some(notification) => {
                        if let Err(e) = self.handle(&notification) {
                            tracing::error!(label = e.as_label(), error = %e, "failed to handle lifecycle notification");
                        }
                    }
                    None => break,
                },
            }
        }
        self.shutdown().await;
    }

    /// Disposes every monitor, then drains subscriber queues within [`Config::grace`].
    pub async fn shutdown(&self) {
        self.dispose();

        let listener = self.listener.lock().take();
        let Some(listener) = listener else {
            return;
        };
        listener.cancel.cancel();
        let set = match listener.join.await {
            Ok(set) => set,
            Err(e) => {
                tracing::error!(error = %e, "subscriber listener failed");
                return;
            }
        };
        if tokio::time::timeout(self.cfg.grace, set.shutdown()).await.is_err() {
            tracing::warn!(grace = ?self.cfg.grace, "subscribers did not drain within grace");
        }
    }

    /// Stops and disposes every monitor and clears the active set. Idempotent.
    pub fn dispose(&self) {
        let drained: Vec<Monitor> = self.monitors.lock().drain().map(|(_, m)| m).collect();
        for monitor in &drained {
            monitor.dispose();
        }
        if !drained.is_empty() {
            tracing::debug!(monitors = drained.len(), "orchestrator disposed");
        }
    }

    /// Parents currently monitored, ordered by session id then pid.
    pub fn active_parents(&self) -> Vec<ParentDescriptor> {
        let mut parents: Vec<ParentDescriptor> = self.monitors.lock().keys().cloned().collect();
        parents.sort_unstable_by(|a, b| {
            a.session_id()
                .cmp(b.session_id())
                .then(a.pid().cmp(&b.pid()))
        });
        parents
    }

    /// True if some monitor has `pid` as its parent.
    pub fn is_monitored(&self, pid: Pid) -> bool {
        self.monitors.lock().keys().any(|p| p.pid() == pid)
    }

    /// Known children of `parent`, or `None` if it is not monitored.
    pub fn children_of(&self, parent: &ParentDescriptor) -> Option<Vec<ProcessDescriptor>> {
        self.monitors.lock().get(parent).map(Monitor::children)
    }

    /// Number of active monitors.
    pub fn len(&self) -> usize {
        self.monitors.lock().len()
    }

    /// True if no monitor is active.
    pub fn is_empty(&self) -> bool {
        self.monitors.lock().is_empty()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.get_mut().as_ref() {
            listener.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::core::testkit::{HookLog, ScriptedProvider, proc};
    use crate::hooks::ProcessHooks;
    use crate::process::ProcessEventKind::Started;
    use crate::subscribers::Subscribe;

    fn orchestrator(provider: Arc<ScriptedProvider>, log: &HookLog) -> Arc<Orchestrator> {
        let log = log.clone();
        Orchestrator::builder(provider, move |_p: &ParentDescriptor| -> Box<dyn ProcessHooks> {
            log.hooks()
        })
        .with_config(Config {
            scan_interval: Duration::from_millis(1000),
            ..Config::default()
        })
        .build()
    }

    fn kinds(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn descendant_is_not_monitored_as_parent() {
        let provider = ScriptedProvider::new(vec![Ok(vec![proc(10, 1, "dotnet")])]);
        let log = HookLog::default();
        let orch = orchestrator(provider, &log);
        let mut notices = orch.notices();

        assert_eq!(orch.process_observed("s1", Some(1)).unwrap(), StartOutcome::Started);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(log.calls(), vec![(Started, 10)]);

        let outcome = orch.process_observed("s2", Some(10)).unwrap();
        assert_eq!(outcome, StartOutcome::RecursionRefused);
        assert_eq!(orch.len(), 1);
        assert!(!orch.is_monitored(10));
        assert!(kinds(&mut notices).contains(&EventKind::RecursionRefused));
    }

    #[tokio::test]
    async fn missing_pid_and_duplicates_are_refused() {
        let provider = ScriptedProvider::new(vec![]);
        let log = HookLog::default();
        let orch = orchestrator(provider, &log);

        assert_eq!(orch.process_observed("s1", None).unwrap(), StartOutcome::MissingPid);
        assert!(orch.is_empty());

        assert_eq!(orch.process_observed("s1", Some(7)).unwrap(), StartOutcome::Started);
        assert_eq!(
            orch.process_observed("s1", Some(7)).unwrap(),
            StartOutcome::AlreadyMonitored
        );
        assert_eq!(orch.process_observed("s2", Some(7)).unwrap(), StartOutcome::Started);
        assert_eq!(orch.len(), 2);
        orch.dispose();
    }

    #[tokio::test]
    async fn stop_only_touches_the_matching_session() {
        let provider = ScriptedProvider::new(vec![]);
        let log = HookLog::default();
        let orch = orchestrator(provider, &log);

        orch.process_observed("s1", Some(1)).unwrap();
        orch.process_observed("s2", Some(2)).unwrap();
        orch.process_observed("s1", Some(3)).unwrap();

        assert_eq!(orch.stop(&LifecycleNotification::process_exited("s1")), 2);
        assert_eq!(orch.active_parents(), vec![ParentDescriptor::new("s2", 2)]);
        assert_eq!(log.disposed(), 2);
        assert_eq!(orch.session_ended("s1"), 0);
    }

    #[tokio::test]
    async fn dispose_is_idempotent() {
        let provider = ScriptedProvider::new(vec![]);
        let log = HookLog::default();
        let orch = orchestrator(provider, &log);

        orch.process_observed("s1", Some(1)).unwrap();
        orch.process_observed("s2", Some(2)).unwrap();
        orch.dispose();
        orch.dispose();
        assert!(orch.is_empty());
        assert_eq!(log.disposed(), 2);
    }

    struct EndSessionOnChild {
        session: String,
        requests: mpsc::UnboundedSender<String>,
    }

    impl ProcessHooks for EndSessionOnChild {
        fn on_process_started(&mut self, _process: &ProcessDescriptor) {
            let _ = self.requests.send(self.session.clone());
        }
        fn on_process_terminated(&mut self, _process: &ProcessDescriptor) {}
    }

    #[tokio::test(start_paused = true)]
    async fn hook_ends_its_own_session_through_a_channel() {
        let provider = ScriptedProvider::new(vec![Ok(vec![proc(10, 1, "dotnet")])]);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let orch = Orchestrator::builder(provider, move |p: &ParentDescriptor| -> Box<dyn ProcessHooks> {
            Box::new(EndSessionOnChild {
                session: p.session_id().to_string(),
                requests: tx.clone(),
            })
        })
        .with_config(Config {
            scan_interval: Duration::from_millis(1000),
            ..Config::default()
        })
        .build();

        orch.process_observed("s1", Some(1)).unwrap();
        let session = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("hook fired")
            .expect("channel open");
        assert_eq!(orch.session_ended(&session), 1);
        assert!(orch.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn handle_dispatches_by_kind() {
        let provider = ScriptedProvider::new(vec![Ok(vec![proc(42, 5, "node")])]);
        let log = HookLog::default();
        let orch = orchestrator(provider, &log);
        let parent = ParentDescriptor::new("s1", 5);

        orch.handle(&LifecycleNotification::process_started("s1", Some(5)))
            .unwrap();
        orch.handle(&LifecycleNotification::other("s1")).unwrap();
        assert!(orch.is_monitored(5));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let children = orch.children_of(&parent).expect("monitored");
        assert_eq!(children, vec![proc(42, 5, "node")]);

        orch.handle(&LifecycleNotification::process_exited("s1"))
            .unwrap();
        assert!(orch.is_empty());
        assert!(orch.children_of(&parent).is_none());
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn serve_runs_until_channel_closes_and_drains_subscribers() {
        let provider = ScriptedProvider::new(vec![]);
        let log = HookLog::default();
        let rec = Arc::new(Recorder::default());
        let hooks_log = log.clone();
        let orch = Orchestrator::builder(provider, move |_p: &ParentDescriptor| -> Box<dyn ProcessHooks> {
            hooks_log.hooks()
        })
        .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
        .build();

        let (tx, rx) = mpsc::channel(8);
        tx.send(LifecycleNotification::process_started("s1", Some(1)))
            .await
            .unwrap();
        tx.send(LifecycleNotification::process_started("s1", None))
            .await
            .unwrap();
        drop(tx);

        orch.serve(rx).await;
        assert!(orch.is_empty());
        assert_eq!(log.disposed(), 1);

        let seen = rec.seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                EventKind::MonitorStarted,
                EventKind::MissingPid,
                EventKind::MonitorStopped
            ]
        );
    }
}
