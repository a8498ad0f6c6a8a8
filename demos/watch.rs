//! # Example: watch
//!
//! Watches the descendants of one process and logs every child that starts or exits.
//!
//! Shows how to:
//! - Build an [`Orchestrator`] over the system process-table provider.
//! - Implement [`ProcessHooks`] and hand them out through a factory closure.
//! - Feed [`LifecycleNotification`]s into [`Orchestrator::serve`].
//!
//! ## Flow
//! ```text
//! main ──► Orchestrator::builder(SysinfoProvider, |parent| LogHooks)
//!     ├─► tx.send(process_started("watch", pid))
//!     └─► serve(rx)
//!           ├─► Monitor ticks every --interval ms
//!           │     └─► LogHooks.on_process_started / on_process_terminated
//!           └─► Ctrl-C ──► dispose ──► subscribers drained
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example watch -- <pid> [interval-ms]
//! ```

use std::{sync::Arc, time::Duration};

use childvisor::{
    Config, LifecycleNotification, LogWriter, Orchestrator, ParentDescriptor, ProcessDescriptor,
    ProcessHooks, Subscribe, SysinfoProvider,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Hooks that log each descendant under the parent it belongs to.
struct LogHooks {
    parent: ParentDescriptor,
    seen: usize,
}

impl ProcessHooks for LogHooks {
    fn on_process_started(&mut self, p: &ProcessDescriptor) {
        self.seen += 1;
        tracing::info!(parent = %self.parent, child = %p, "child started");
    }

    fn on_process_terminated(&mut self, p: &ProcessDescriptor) {
        tracing::info!(parent = %self.parent, child = %p, "child exited");
    }

    fn dispose(&mut self) {
        tracing::info!(parent = %self.parent, seen = self.seen, "done watching");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let pid: u32 = match args.next() {
        Some(raw) => raw.parse()?,
        None => std::process::id(),
    };
    let interval = match args.next() {
        Some(raw) => Duration::from_millis(raw.parse()?),
        None => Duration::from_secs(1),
    };

    let cfg = Config {
        scan_interval: interval,
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let orch = Orchestrator::builder(Arc::new(SysinfoProvider::new()), |parent: &ParentDescriptor| {
        Box::new(LogHooks {
            parent: parent.clone(),
            seen: 0,
        }) as Box<dyn ProcessHooks>
    })
    .with_config(cfg)
    .with_subscribers(subs)
    .build();

    let (tx, rx) = mpsc::channel(16);
    tx.send(LifecycleNotification::process_started("watch", Some(pid)))
        .await?;

    // Keep `tx` alive so serve runs until Ctrl-C.
    let _tx = tx;
    tracing::info!(pid, ?interval, "watching; press Ctrl-C to stop");
    orch.serve(rx).await;
    Ok(())
}
