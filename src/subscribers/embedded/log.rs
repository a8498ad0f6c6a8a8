//! # LogWriter: notice renderer
//!
//! A subscriber that renders every notice as one `tracing` record under the
//! `childvisor::notice` target. User-facing notices (monitor start/stop, descendants
//! appearing or exiting, refusals) go out at `INFO`; scan trouble at `WARN`.
//!
//! ## Example output
//! ```text
//! INFO childvisor::notice: [monitor-started] parent=4242 session="s-1"
//! INFO childvisor::notice: [process-started] parent=4242 pid=4250 command="dotnet"
//! WARN childvisor::notice: [scan-failed] parent=4242 reason="io: permission denied"
//! INFO childvisor::notice: [process-terminated] parent=4242 pid=4250 command="dotnet"
//! INFO childvisor::notice: [recursion-refused] parent=4250 session="s-2"
//! INFO childvisor::notice: [monitor-stopped] parent=4242 session="s-1"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Notice writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let label = e.kind.as_label();
        let session = e.session.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::MonitorStarted
            | EventKind::MonitorStopped
            | EventKind::RecursionRefused
            | EventKind::AlreadyMonitored => {
                tracing::info!(
                    target: "childvisor::notice",
                    "[{label}] parent={:?} session={session:?}",
                    e.parent_pid
                );
            }
            EventKind::ProcessStarted | EventKind::ProcessTerminated => {
                tracing::info!(
                    target: "childvisor::notice",
                    "[{label}] parent={:?} pid={:?} command={:?}",
                    e.parent_pid,
                    e.pid,
                    e.command.as_deref().unwrap_or("")
                );
            }
            EventKind::MissingPid | EventKind::ShutdownRequested => {
                tracing::info!(target: "childvisor::notice", "[{label}] session={session:?}");
            }
            EventKind::ScanSkipped | EventKind::MonitorAlreadyStopped => {
                tracing::debug!(
                    target: "childvisor::notice",
                    "[{label}] parent={:?} session={session:?}",
                    e.parent_pid
                );
            }
            EventKind::ScanFailed => {
                tracing::warn!(
                    target: "childvisor::notice",
                    "[{label}] parent={:?} reason={:?}",
                    e.parent_pid,
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(
                    target: "childvisor::notice",
                    "[{label}] subscriber={} info={}",
                    e.source.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
