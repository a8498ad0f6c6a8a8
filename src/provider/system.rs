//! # System process-table provider.
//!
//! [`SysinfoProvider`] refreshes the operating system's process list through `sysinfo`,
//! builds a parent map from each process's parent pid and walks it breadth-first from the
//! requested root. The root itself is never part of the result. The refresh runs on
//! tokio's blocking pool.
//!
//! ```text
//! System::refresh_processes ─► (pid, parent, name) table ─► ppid → [children]
//!                                                              │
//!                                        BFS from root ◄───────┘ ─► Vec<ProcessDescriptor>
//! ```
//!
//! Works wherever `sysinfo` can list processes (Linux, macOS, Windows, FreeBSD). Processes
//! without a parent are roots of their own tree and are only reachable as `root`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::SnapshotError;
use crate::process::{Pid, ProcessDescriptor};
use crate::provider::SnapshotProvider;

/// One row of the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableEntry {
    pid: Pid,
    parent_pid: Option<Pid>,
    command: String,
}

/// Snapshot provider backed by the operating system's process table.
///
/// Cheap to clone; clones share one `sysinfo::System`, refreshed on every request.
#[derive(Clone)]
pub struct SysinfoProvider {
    system: Arc<Mutex<System>>,
}

impl SysinfoProvider {
    /// Creates a new provider. No process is read until the first request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotProvider for SysinfoProvider {
    async fn descendants(&self, pid: Pid) -> Result<Vec<ProcessDescriptor>, SnapshotError> {
        let system = Arc::clone(&self.system);
        tokio::task::spawn_blocking(move || {
            let table = read_process_table(&mut system.lock());
            descendants_of(&table, pid)
        })
        .await
        .map_err(|e| SnapshotError::failed(format!("process table walker aborted: {e}")))
    }

    fn name(&self) -> &'static str {
        "sysinfo"
    }
}

fn read_process_table(system: &mut System) -> Vec<TableEntry> {
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true, // forget exited processes
        ProcessRefreshKind::nothing(),
    );
    system
        .processes()
        .iter()
        .map(|(pid, process)| TableEntry {
            pid: pid.as_u32(),
            parent_pid: process.parent().map(|p| p.as_u32()),
            command: process.name().to_string_lossy().into_owned(),
        })
        .collect()
}

/// Breadth-first walk of the process table from `root`, excluding `root`.
///
/// Results are ordered by depth, then by pid within each parent.
fn descendants_of(table: &[TableEntry], root: Pid) -> Vec<ProcessDescriptor> {
    let mut children: HashMap<Pid, Vec<&TableEntry>> = HashMap::new();
    for entry in table {
        match entry.parent_pid {
            Some(parent) if parent != entry.pid => {
                children.entry(parent).or_default().push(entry);
            }
            _ => {}
        }
    }
    for list in children.values_mut() {
        list.sort_unstable_by_key(|e| e.pid);
    }

    let mut out = Vec::new();
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(pid) = queue.pop_front() {
        let Some(list) = children.get(&pid) else {
            continue;
        };
        for entry in list {
            // parent links are read per process, so a racing pid reuse can form a loop
            if !seen.insert(entry.pid) {
                continue;
            }
            out.push(ProcessDescriptor::new(
                entry.pid,
                pid,
                entry.command.as_str(),
            ));
            queue.push_back(entry.pid);
        }
    }
    out
}
