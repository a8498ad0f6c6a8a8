//! # Monitor: watches the descendants of one parent process.
//!
//! A [`Monitor`] owns the polling loop of a single [`ParentDescriptor`]. Every tick asks
//! the [`SnapshotProvider`](crate::SnapshotProvider) for the parent's descendants, diffs
//! them against the children it already knows, and pushes the resulting events through
//! its pipeline into the hooks.
//!
//! ## Architecture
//! ```text
//! start() ──► pipeline.subscribe(StateApplier) ──► spawn tick_loop
//!
//! tick_loop (every scan_interval, until cancelled):
//!   ├─► permit = ScanPermit::acquire()
//!   │     └─ busy → ScanSkipped (log), nothing else
//!   └─► spawn scan(permit)
//!         ├─► provider.descendants(parent.pid).await
//!         │     └─ Err → ScanFailed (log), known children untouched
//!         ├─► ScanDiff::compute(known as of before this tick, snapshot)
//!         ├─► pipeline.publish(Started..., then Terminated...)
//!         │     └─► StateApplier: update known children ─► hooks
//!         └─► drop(permit)  (also on panic)
//! ```
//!
//! ## Rules
//! - At most **one scan in flight**; an overlapping tick is skipped, never queued.
//! - Tick N's events are applied before tick N+1 may request a snapshot.
//! - `stop()` cancels future ticks at once; an in-flight scan finishes and its events
//!   are dropped by the completed pipeline.
//! - A stopped monitor cannot be restarted.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::core::diff::ScanDiff;
use crate::core::pipeline::EventPipeline;
use crate::error::MonitorError;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::ProcessHooks;
use crate::process::{ParentDescriptor, Pid, ProcessDescriptor, ProcessEvent, ProcessEventKind};
use crate::provider::ProviderRef;

type KnownChildren = Arc<RwLock<HashMap<Pid, ProcessDescriptor>>>;
type SharedHooks = Arc<Mutex<Option<Box<dyn ProcessHooks>>>>;

/// Parameters for a monitor, extracted from [`Config`] by the orchestrator.
#[derive(Clone, Debug)]
pub struct MonitorParams {
    /// Period between two ticks.
    pub scan_interval: Duration,
}

impl From<&Config> for MonitorParams {
    fn from(cfg: &Config) -> Self {
        Self {
            scan_interval: cfg.scan_interval_clamped(),
        }
    }
}

impl Default for MonitorParams {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Lifecycle of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Built, never started.
    Idle,
    /// Ticking.
    Running,
    /// Stopped for good.
    Stopped,
}

enum Lifecycle {
    Idle,
    Running(Ticker),
    Stopped,
}

/// Handle to the spawned tick loop.
struct Ticker {
    cancel: CancellationToken,
    _join: JoinHandle<()>,
}

/// Watches the descendants of one parent process.
pub struct Monitor {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

/// State reachable from the tick loop and the scan tasks.
struct Shared {
    parent: ParentDescriptor,
    params: MonitorParams,
    provider: ProviderRef,
    bus: Bus,
    known: KnownChildren,
    in_flight: Arc<AtomicBool>,
    pipeline: EventPipeline,
    hooks: SharedHooks,
}

impl Monitor {
    /// Creates an idle monitor for `parent`.
    ///
    /// The monitor exclusively owns `hooks` and disposes them in [`Monitor::dispose`].
    pub fn new(
        parent: ParentDescriptor,
        provider: ProviderRef,
        hooks: Box<dyn ProcessHooks>,
        params: MonitorParams,
        bus: Bus,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                parent,
                params,
                provider,
                bus,
                known: Arc::new(RwLock::new(HashMap::new())),
                in_flight: Arc::new(AtomicBool::new(false)),
                pipeline: EventPipeline::new(),
                hooks: Arc::new(Mutex::new(Some(hooks))),
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// The parent this monitor tracks.
    pub fn parent(&self) -> &ParentDescriptor {
        &self.shared.parent
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        match *self.lifecycle.lock() {
            Lifecycle::Idle => MonitorState::Idle,
            Lifecycle::Running(_) => MonitorState::Running,
            Lifecycle::Stopped => MonitorState::Stopped,
        }
    }

    /// Starts polling.
    ///
    /// Subscribes the state handler to the pipeline, then schedules the first tick one
    /// `scan_interval` from now. No scan runs inside this call.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - [`MonitorError::AlreadyRunning`] if the monitor is running; the running ticker
    ///   is left untouched.
    /// - [`MonitorError::Finished`] if the monitor was stopped.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut lifecycle = self.lifecycle.lock();
        let parent = &self.shared.parent;
        match *lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running(_) => {
                tracing::error!(pid = parent.pid(), "monitor already started for process");
                return Err(MonitorError::AlreadyRunning {
                    parent: parent.clone(),
                });
            }
            Lifecycle::Stopped => {
                tracing::error!(pid = parent.pid(), "monitor was stopped and cannot restart");
                return Err(MonitorError::Finished {
                    parent: parent.clone(),
                });
            }
        }

        tracing::info!(pid = parent.pid(), session = parent.session_id(), "starting monitor on process");
        let mut applier = StateApplier {
            parent: parent.clone(),
            known: Arc::clone(&self.shared.known),
            hooks: Arc::clone(&self.shared.hooks),
            bus: self.shared.bus.clone(),
        };
        self.shared
            .pipeline
            .subscribe(move |ev: ProcessEvent| applier.apply(ev))?;

        let cancel = CancellationToken::new();
        let join = tokio::spawn(Arc::clone(&self.shared).tick_loop(cancel.clone()));
        *lifecycle = Lifecycle::Running(Ticker {
            cancel,
            _join: join,
        });
        drop(lifecycle);

        self.shared
            .bus
            .publish(Event::new(EventKind::MonitorStarted).with_parent(parent));
        Ok(())
    }

    /// Stops polling.
    ///
    /// Cancels the tick schedule and completes the pipeline. Calling it on a monitor that
    /// is not running only logs a warning.
    pub fn stop(&self) {
        let parent = &self.shared.parent;
        let previous = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Stopped);
        match previous {
            Lifecycle::Running(ticker) => {
                tracing::info!(pid = parent.pid(), "stopping monitor on process");
                ticker.cancel.cancel();
                self.shared.pipeline.complete();
                self.shared
                    .bus
                    .publish(Event::new(EventKind::MonitorStopped).with_parent(parent));
            }
            Lifecycle::Idle | Lifecycle::Stopped => {
                tracing::warn!(pid = parent.pid(), "monitor on process already stopped");
                self.shared.pipeline.complete();
                self.shared
                    .bus
                    .publish(Event::new(EventKind::MonitorAlreadyStopped).with_parent(parent));
            }
        }
    }

    /// Stops the monitor if it is running, then disposes its hooks (once).
    pub fn dispose(&self) {
        if self.state() == MonitorState::Running {
            self.stop();
        } else {
            *self.lifecycle.lock() = Lifecycle::Stopped;
            self.shared.pipeline.complete();
        }
        let hooks = self.shared.hooks.lock().take();
        if let Some(mut hooks) = hooks {
            tracing::debug!(pid = self.shared.parent.pid(), "disposing monitor hooks");
            hooks.dispose();
        }
    }

    /// Point-in-time view of the known children's pids, in ascending order.
    ///
    /// Reflects only events already applied. The iterator is `Clone`, so the same
    /// snapshot can be walked again.
    pub fn child_pids(&self) -> std::vec::IntoIter<Pid> {
        let mut pids: Vec<Pid> = self.shared.known.read().keys().copied().collect();
        pids.sort_unstable();
        pids.into_iter()
    }

    /// Point-in-time copy of the known children, ordered by pid.
    pub fn children(&self) -> Vec<ProcessDescriptor> {
        let mut children: Vec<ProcessDescriptor> =
            self.shared.known.read().values().cloned().collect();
        children.sort_unstable_by_key(|d| d.pid());
        children
    }

    /// True if `pid` is currently a known child.
    pub fn is_tracking(&self, pid: Pid) -> bool {
        self.shared.known.read().contains_key(&pid)
    }

    /// True while a scan is outstanding.
    pub fn is_scanning(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Runs one tick as the timer would. Returns the scan task, or `None` if skipped.
    #[cfg(test)]
    fn tick(&self) -> Option<JoinHandle<()>> {
        self.shared.on_tick()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Lifecycle::Running(ticker) = &*self.lifecycle.get_mut() {
            ticker.cancel.cancel();
        }
    }
}

impl Shared {
    async fn tick_loop(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.params.scan_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.on_tick();
                }
            }
        }
    }

    fn on_tick(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let Some(permit) = ScanPermit::acquire(&self.in_flight) else {
            tracing::debug!(pid = self.parent.pid(), "child process scan already active for process");
            self.bus
                .publish(Event::new(EventKind::ScanSkipped).with_parent(&self.parent));
            return None;
        };
        let me = Arc::clone(self);
        Some(tokio::spawn(async move { me.scan(permit).await }))
    }

    async fn scan(&self, permit: ScanPermit) {
        match self.provider.descendants(self.parent.pid()).await {
            Ok(_) if self.pipeline.is_completed() => {
                tracing::trace!(pid = self.parent.pid(), "monitor stopped during scan");
            }
            Ok(snapshot) => {
                let mut diff = {
                    let known = self.known.read();
                    ScanDiff::compute(&known, snapshot)
                };
                let refreshed = std::mem::take(&mut diff.refreshed);
                if diff.is_empty() {
                    tracing::trace!(pid = self.parent.pid(), "no child process changes");
                }
                for event in diff.into_events() {
                    if !self.pipeline.publish(event) {
                        tracing::trace!(pid = self.parent.pid(), "monitor stopped; dropping scan result");
                    }
                }
                self.retain_latest(refreshed);
            }
            Err(e) => {
                tracing::warn!(
                    pid = self.parent.pid(),
                    provider = self.provider.name(),
                    label = e.as_label(),
                    error = %e,
                    "child process scan failed"
                );
                self.bus.publish(
                    Event::new(EventKind::ScanFailed)
                        .with_parent(&self.parent)
                        .with_reason(e.as_message()),
                );
            }
        }
        drop(permit);
    }

    /// Replaces retained descriptors of children that were reread with new details.
    fn retain_latest(&self, refreshed: Vec<ProcessDescriptor>) {
        if refreshed.is_empty() || self.pipeline.is_completed() {
            return;
        }
        let mut known = self.known.write();
        for process in refreshed {
            if let Some(slot) = known.get_mut(&process.pid()) {
                *slot = process;
            }
        }
    }
}

/// Exclusive right to run one scan; clears the in-flight marker on drop.
struct ScanPermit(Arc<AtomicBool>);

impl ScanPermit {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The pipeline's only subscriber: applies events to the known children, then notifies.
struct StateApplier {
    parent: ParentDescriptor,
    known: KnownChildren,
    hooks: SharedHooks,
    bus: Bus,
}

impl StateApplier {
    fn apply(&mut self, event: ProcessEvent) {
        let process = event.descriptor();
        match event.kind() {
            ProcessEventKind::Started => {
                self.known.write().insert(process.pid(), process.clone());
                tracing::info!(parent = self.parent.pid(), pid = process.pid(), command = process.command(), "child process started");
                if let Some(hooks) = self.hooks.lock().as_mut() {
                    hooks.on_process_started(process);
                }
                self.bus.publish(
                    Event::new(EventKind::ProcessStarted)
                        .with_parent(&self.parent)
                        .with_process(process),
                );
            }
            ProcessEventKind::Terminated => {
                if self.known.write().remove(&process.pid()).is_none() {
                    return;
                }
                tracing::info!(parent = self.parent.pid(), pid = process.pid(), command = process.command(), "child process terminated");
                if let Some(hooks) = self.hooks.lock().as_mut() {
                    hooks.on_process_terminated(process);
                }
                self.bus.publish(
                    Event::new(EventKind::ProcessTerminated)
                        .with_parent(&self.parent)
                        .with_process(process),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testkit::{HookLog, ScriptedProvider, proc, settle};
    use crate::error::SnapshotError;
    use crate::process::ProcessEventKind::{Started, Terminated};

    const HOUR: Duration = Duration::from_secs(3600);

    fn monitor(provider: Arc<ScriptedProvider>, log: &HookLog, interval: Duration) -> Monitor {
        Monitor::new(
            ParentDescriptor::new("session-1", 1),
            provider,
            log.hooks(),
            MonitorParams {
                scan_interval: interval,
            },
            Bus::new(64),
        )
    }

    async fn run_tick(m: &Monitor) {
        m.tick().expect("tick not skipped").await.expect("scan task");
    }

    #[tokio::test]
    async fn scenario_a_new_child_is_started() {
        let provider = ScriptedProvider::new(vec![Ok(vec![proc(10, 1, "dotnet")])]);
        let log = HookLog::default();
        let m = monitor(provider, &log, HOUR);
        m.start().unwrap();

        run_tick(&m).await;
        assert_eq!(m.child_pids().collect::<Vec<_>>(), vec![10]);
        assert_eq!(log.calls(), vec![(Started, 10)]);
    }

    #[tokio::test]
    async fn scenario_b_missing_child_is_terminated() {
        let provider = ScriptedProvider::new(vec![Ok(vec![proc(10, 1, "dotnet")]), Ok(vec![])]);
        let log = HookLog::default();
        let m = monitor(provider, &log, HOUR);
        m.start().unwrap();

        run_tick(&m).await;
        run_tick(&m).await;
        assert_eq!(m.child_pids().count(), 0);
        assert_eq!(log.calls(), vec![(Started, 10), (Terminated, 10)]);
    }

    #[tokio::test]
    async fn scenario_c_provider_error_keeps_state_and_next_tick_proceeds() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![proc(10, 1, "dotnet")]),
            Err(SnapshotError::failed("ps exploded")),
            Ok(vec![proc(10, 1, "dotnet"), proc(11, 10, "node")]),
        ]);
        let log = HookLog::default();
        let m = monitor(Arc::clone(&provider), &log, HOUR);
        m.start().unwrap();

        run_tick(&m).await;
        let before = m.children();
        run_tick(&m).await;
        assert_eq!(m.children(), before);
        assert!(!m.is_scanning());

        run_tick(&m).await;
        assert_eq!(provider.calls(), 3);
        assert_eq!(m.child_pids().collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(log.calls(), vec![(Started, 10), (Started, 11)]);
    }

    #[tokio::test]
    async fn known_set_follows_snapshot_sequence() {
        let snapshots = vec![
            vec![1, 2, 3],
            vec![2, 3, 4],
            vec![],
            vec![5],
            vec![5, 6, 7],
            vec![7],
        ];
        let provider = ScriptedProvider::new(
            snapshots
                .iter()
                .map(|pids| Ok(pids.iter().map(|p| proc(*p + 100, 1, "x")).collect()))
                .collect(),
        );
        let log = HookLog::default();
        let m = monitor(provider, &log, HOUR);
        m.start().unwrap();

        for pids in &snapshots {
            run_tick(&m).await;
            let expected: Vec<Pid> = pids.iter().map(|p| p + 100).collect();
            assert_eq!(m.child_pids().collect::<Vec<_>>(), expected);
        }
    }

    #[tokio::test]
    async fn started_applied_before_terminated_within_a_tick() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![proc(20, 1, "a")]),
            Ok(vec![proc(21, 1, "b")]),
        ]);
        let log = HookLog::default();
        let m = monitor(provider, &log, HOUR);
        m.start().unwrap();

        run_tick(&m).await;
        run_tick(&m).await;
        assert_eq!(
            log.calls(),
            vec![(Started, 20), (Started, 21), (Terminated, 20)]
        );
    }

    #[tokio::test]
    async fn overlapping_tick_is_skipped_not_queued() {
        let (provider, gate) = ScriptedProvider::gated(vec![Ok(vec![proc(10, 1, "x")])]);
        let log = HookLog::default();
        let m = monitor(Arc::clone(&provider), &log, HOUR);
        let mut notices = m.shared.bus.subscribe();
        m.start().unwrap();

        let first = m.tick().expect("first tick runs");
        settle(|| provider.calls() == 1).await;
        assert!(m.is_scanning());

        assert!(m.tick().is_none());
        assert_eq!(provider.calls(), 1);

        gate.add_permits(1);
        first.await.unwrap();
        assert!(!m.is_scanning());
        assert_eq!(m.child_pids().collect::<Vec<_>>(), vec![10]);

        gate.add_permits(1);
        run_tick(&m).await;
        assert_eq!(provider.calls(), 2);

        let mut kinds = Vec::new();
        while let Ok(ev) = notices.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::ScanSkipped));
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_fails_and_keeps_one_ticker() {
        let provider = ScriptedProvider::new(vec![]);
        let log = HookLog::default();
        let m = monitor(Arc::clone(&provider), &log, Duration::from_millis(1000));

        m.start().unwrap();
        let err = m.start().unwrap_err();
        assert_eq!(err.as_label(), "monitor_already_running");
        assert_eq!(m.state(), MonitorState::Running);

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(provider.calls(), 3);

        m.stop();
        assert_eq!(m.state(), MonitorState::Stopped);
        assert_eq!(m.start().unwrap_err().as_label(), "monitor_finished");
    }

    #[tokio::test(start_paused = true)]
    async fn timer_drives_scans_at_interval() {
        let provider = ScriptedProvider::new(vec![Ok(vec![proc(10, 1, "dotnet")])]);
        let log = HookLog::default();
        let m = monitor(Arc::clone(&provider), &log, Duration::from_millis(1000));
        m.start().unwrap();
        assert_eq!(provider.calls(), 0);

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(provider.calls(), 0);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(m.child_pids().collect::<Vec<_>>(), vec![10]);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(log.calls(), vec![(Started, 10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn double_stop_is_harmless_and_no_more_scans() {
        let provider = ScriptedProvider::new(vec![]);
        let log = HookLog::default();
        let m = monitor(Arc::clone(&provider), &log, Duration::from_millis(1000));
        let mut notices = m.shared.bus.subscribe();
        m.start().unwrap();

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(provider.calls(), 1);

        m.stop();
        m.stop();
        assert_eq!(m.state(), MonitorState::Stopped);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.calls(), 1);

        let mut kinds = Vec::new();
        while let Ok(ev) = notices.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::MonitorStarted,
                EventKind::MonitorStopped,
                EventKind::MonitorAlreadyStopped
            ]
        );
    }

    #[tokio::test]
    async fn results_of_scan_in_flight_at_stop_are_dropped() {
        let (provider, gate) = ScriptedProvider::gated(vec![Ok(vec![proc(10, 1, "x")])]);
        let log = HookLog::default();
        let m = monitor(Arc::clone(&provider), &log, HOUR);
        m.start().unwrap();

        let scan = m.tick().unwrap();
        settle(|| provider.calls() == 1).await;
        m.stop();

        gate.add_permits(1);
        scan.await.unwrap();
        assert_eq!(m.child_pids().count(), 0);
        assert!(log.calls().is_empty());
        assert!(!m.is_scanning());
    }

    #[tokio::test]
    async fn dispose_stops_and_disposes_hooks_once() {
        let provider = ScriptedProvider::new(vec![]);
        let log = HookLog::default();
        let m = monitor(provider, &log, HOUR);
        m.start().unwrap();

        m.dispose();
        m.dispose();
        assert_eq!(m.state(), MonitorState::Stopped);
        assert_eq!(log.disposed(), 1);
    }

    #[tokio::test]
    async fn latest_descriptor_is_retained() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![proc(10, 1, "sh")]),
            Ok(vec![proc(10, 1, "dotnet")]),
            Ok(vec![]),
        ]);
        let log = HookLog::default();
        let m = monitor(provider, &log, HOUR);
        let mut notices = m.shared.bus.subscribe();
        m.start().unwrap();

        run_tick(&m).await;
        run_tick(&m).await;
        assert_eq!(m.children(), vec![proc(10, 1, "dotnet")]);
        assert_eq!(log.calls(), vec![(Started, 10)]);

        run_tick(&m).await;
        let terminated = std::iter::from_fn(|| notices.try_recv().ok())
            .find(|ev| ev.kind == EventKind::ProcessTerminated)
            .expect("terminated notice");
        assert_eq!(terminated.command.as_deref(), Some("dotnet"));
    }

    #[tokio::test]
    async fn child_pids_is_a_restartable_snapshot() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![proc(3, 1, "x"), proc(2, 1, "y")]),
            Ok(vec![]),
        ]);
        let log = HookLog::default();
        let m = monitor(provider, &log, HOUR);
        m.start().unwrap();
        run_tick(&m).await;

        let view = m.child_pids();
        run_tick(&m).await;
        assert_eq!(view.clone().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(view.collect::<Vec<_>>(), vec![2, 3]);
        assert!(m.child_pids().next().is_none());
    }
}
