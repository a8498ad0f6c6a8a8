//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders notices through `tracing` (feature `logging`).

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
