//! # Process-tree snapshot providers.
//!
//! A monitor never enumerates processes itself: each tick asks a [`SnapshotProvider`]
//! for every descendant of the tracked pid.
//!
//! - [`SnapshotProvider`] - async trait implemented by providers
//! - [`ProviderFn`] - closure-backed provider (tests, adapters)
//! - [`SysinfoProvider`] - operating system process table (via `sysinfo`)
//! - [`ProviderRef`] - shared handle (`Arc<dyn SnapshotProvider>`)

mod provider;
mod provider_fn;
mod system;

pub use provider::{ProviderRef, SnapshotProvider};
pub use provider_fn::ProviderFn;
pub use system::SysinfoProvider;
