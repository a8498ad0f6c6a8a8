//! # Notice subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in implementations.
//!
//! ## Architecture
//! ```text
//! Monitor / Orchestrator ── publish(Event) ──► Bus ──► subscriber listener
//!                                                          │
//!                                                          ▼
//!                                                   SubscriberSet::emit(&Event)
//!                                                     ┌────┴────┬─────────┐
//!                                                     ▼         ▼         ▼
//!                                                 LogWriter   Custom     ...
//! ```

mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
