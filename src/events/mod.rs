//! Runtime notices: types and broadcast bus.
//!
//! This module groups the notice **data model** and the **bus** used to publish
//! and subscribe to what monitors and the orchestrator do.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] notice classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator` (monitor lifecycle, refusals), `Monitor`
//!   (start/stop, skipped and failed scans, process start/terminate),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the orchestrator's subscriber listener, which fans out to the
//!   [`SubscriberSet`](crate::SubscriberSet).
//!
//! Notices never drive monitor state; they only report it.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
