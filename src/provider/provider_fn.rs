//! # Function-backed provider (`ProviderFn`)
//!
//! [`ProviderFn`] wraps a closure `F: Fn(Pid) -> Fut`, producing a fresh future per
//! snapshot request. Shared state, if any, must be captured explicitly (`Arc<...>`).
//!
//! ## Example
//! ```rust
//! use childvisor::{Pid, ProcessDescriptor, ProviderFn, ProviderRef, SnapshotError, SnapshotProvider};
//!
//! let provider: ProviderRef = ProviderFn::arc("static", |pid: Pid| async move {
//!     Ok::<_, SnapshotError>(vec![ProcessDescriptor::new(pid + 1, pid, "dotnet")])
//! });
//! assert_eq!(provider.name(), "static");
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SnapshotError;
use crate::process::{Pid, ProcessDescriptor};
use crate::provider::SnapshotProvider;

/// Function-backed snapshot provider.
#[derive(Debug)]
pub struct ProviderFn<F> {
    name: &'static str,
    f: F,
}

impl<F> ProviderFn<F> {
    /// Creates a new function-backed provider.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Creates the provider and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> SnapshotProvider for ProviderFn<F>
where
    F: Fn(Pid) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<ProcessDescriptor>, SnapshotError>> + Send + 'static,
{
    async fn descendants(&self, pid: Pid) -> Result<Vec<ProcessDescriptor>, SnapshotError> {
        (self.f)(pid).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
