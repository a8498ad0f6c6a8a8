//! # Snapshot diffing.
//!
//! Compares one snapshot against the known-children map **as it stood before the tick**.
//! The diff only reads; the pipeline handler is the only writer of the map.
//!
//! ```text
//! known (pre-tick)      snapshot
//!   {10, 11}            {11, 12}
//!        │                 │
//!        └──── compute ────┘
//!               │
//!   started    = snapshot \ known = {12}
//!   terminated = known \ snapshot = {10}
//! ```
//!
//! ## Rules
//! - Identity is the pid; a pid present in both is neither started nor terminated.
//! - A pid present in both whose descriptor changed (command or parent pid reread) is
//!   listed as refreshed, so the latest descriptor can be retained without an event.
//! - Duplicate pids in a snapshot collapse to the last descriptor.
//! - Terminated events carry the descriptor retained in the map.
//! - Both lists are sorted by pid.

use std::collections::{BTreeMap, HashMap};

use crate::process::{Pid, ProcessDescriptor, ProcessEvent};

/// Result of comparing a snapshot with the known children.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ScanDiff {
    pub started: Vec<ProcessDescriptor>,
    pub terminated: Vec<ProcessDescriptor>,
    pub refreshed: Vec<ProcessDescriptor>,
}

impl ScanDiff {
    /// Computes the diff of `snapshot` against `known`.
    pub fn compute(
        known: &HashMap<Pid, ProcessDescriptor>,
        snapshot: impl IntoIterator<Item = ProcessDescriptor>,
    ) -> Self {
        let running: BTreeMap<Pid, ProcessDescriptor> =
            snapshot.into_iter().map(|d| (d.pid(), d)).collect();

        let mut started = Vec::new();
        let mut refreshed = Vec::new();
        for d in running.values() {
            match known.get(&d.pid()) {
                None => started.push(d.clone()),
                Some(old) if old != d => refreshed.push(d.clone()),
                Some(_) => {}
            }
        }

        let mut terminated: Vec<ProcessDescriptor> = known
            .values()
            .filter(|d| !running.contains_key(&d.pid()))
            .cloned()
            .collect();
        terminated.sort_unstable_by_key(|d| d.pid());

        Self {
            started,
            terminated,
            refreshed,
        }
    }

    /// True if the diff produces no events.
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.terminated.is_empty()
    }

    /// Consumes the diff into events: every `Started`, then every `Terminated`.
    pub fn into_events(self) -> impl Iterator<Item = ProcessEvent> {
        self.started
            .into_iter()
            .map(ProcessEvent::started)
            .chain(self.terminated.into_iter().map(ProcessEvent::terminated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessEventKind;

    fn known(entries: &[(Pid, &str)]) -> HashMap<Pid, ProcessDescriptor> {
        entries
            .iter()
            .map(|(pid, cmd)| (*pid, ProcessDescriptor::new(*pid, 1, *cmd)))
            .collect()
    }

    fn pids(list: &[ProcessDescriptor]) -> Vec<Pid> {
        list.iter().map(|d| d.pid()).collect()
    }

    #[test]
    fn empty_known_everything_started() {
        let diff = ScanDiff::compute(
            &HashMap::new(),
            vec![ProcessDescriptor::new(10, 1, "dotnet")],
        );
        assert_eq!(pids(&diff.started), vec![10]);
        assert!(diff.terminated.is_empty());
    }

    #[test]
    fn empty_snapshot_everything_terminated() {
        let diff = ScanDiff::compute(&known(&[(10, "dotnet"), (3, "node")]), Vec::new());
        assert!(diff.started.is_empty());
        assert_eq!(pids(&diff.terminated), vec![3, 10]);
    }

    #[test]
    fn overlap_is_neither_started_nor_terminated() {
        let diff = ScanDiff::compute(
            &known(&[(10, "a"), (11, "b")]),
            vec![
                ProcessDescriptor::new(12, 1, "c"),
                ProcessDescriptor::new(11, 1, "b"),
            ],
        );
        assert_eq!(pids(&diff.started), vec![12]);
        assert_eq!(pids(&diff.terminated), vec![10]);
    }

    #[test]
    fn terminated_carries_retained_descriptor() {
        let diff = ScanDiff::compute(&known(&[(10, "dotnet")]), Vec::new());
        assert_eq!(diff.terminated[0].command(), "dotnet");
    }

    #[test]
    fn duplicate_pids_collapse_to_last() {
        let diff = ScanDiff::compute(
            &HashMap::new(),
            vec![
                ProcessDescriptor::new(5, 1, "sh"),
                ProcessDescriptor::new(5, 1, "dotnet"),
            ],
        );
        assert_eq!(diff.started.len(), 1);
        assert_eq!(diff.started[0].command(), "dotnet");
    }

    #[test]
    fn started_events_precede_terminated_events() {
        let diff = ScanDiff::compute(
            &known(&[(1, "old")]),
            vec![ProcessDescriptor::new(2, 1, "new")],
        );
        assert!(!diff.is_empty());
        let kinds: Vec<ProcessEventKind> = diff.into_events().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![ProcessEventKind::Started, ProcessEventKind::Terminated]
        );
    }

    #[test]
    fn reread_descriptor_is_refreshed_without_events() {
        let diff = ScanDiff::compute(&known(&[(7, "sh")]), vec![ProcessDescriptor::new(7, 1, "dotnet")]);
        assert!(diff.is_empty());
        assert_eq!(diff.refreshed, vec![ProcessDescriptor::new(7, 1, "dotnet")]);
    }

    #[test]
    fn unchanged_snapshot_is_empty() {
        let diff = ScanDiff::compute(&known(&[(7, "x")]), vec![ProcessDescriptor::new(7, 1, "x")]);
        assert!(diff.is_empty());
    }
}
