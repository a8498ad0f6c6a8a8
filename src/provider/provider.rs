//! # Snapshot provider abstraction.
//!
//! A provider answers one question: which processes currently descend from `pid`?
//! The call may be slow or fail; the monitor guards against overlapping calls and treats
//! every failure as "no information this tick".

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SnapshotError;
use crate::process::{Pid, ProcessDescriptor};

/// Shared handle to a provider.
pub type ProviderRef = Arc<dyn SnapshotProvider>;

/// # Source of process-tree snapshots.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use childvisor::{Pid, ProcessDescriptor, SnapshotError, SnapshotProvider};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl SnapshotProvider for Fixed {
///     async fn descendants(&self, pid: Pid) -> Result<Vec<ProcessDescriptor>, SnapshotError> {
///         Ok(vec![ProcessDescriptor::new(pid + 1, pid, "node")])
///     }
/// }
/// ```
#[async_trait]
pub trait SnapshotProvider: Send + Sync + 'static {
    /// Returns every descendant of `pid` (children, grandchildren, ...), excluding `pid`.
    async fn descendants(&self, pid: Pid) -> Result<Vec<ProcessDescriptor>, SnapshotError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
