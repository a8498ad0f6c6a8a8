//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the orchestrator and the monitors
//! it creates.
//!
//! ## Sentinel values
//! - `scan_interval = 0s` → clamped to 1 ms (a zero period cannot drive a timer)
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the orchestrator runtime.
///
/// ## Field semantics
/// - `scan_interval`: period between two snapshot requests of one monitor
/// - `bus_capacity`: notice bus ring buffer size (min 1)
/// - `grace`: how long shutdown waits for subscribers to drain their queues
///
/// ## Notes
/// All fields are public. Prefer the clamping accessors over reading them directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Period of the per-monitor scan timer.
    ///
    /// A tick that fires while the previous scan is still in flight is skipped,
    /// never queued.
    pub scan_interval: Duration,

    /// Capacity of the notice bus broadcast channel.
    ///
    /// Listeners that lag behind more than `bus_capacity` notices skip the oldest ones.
    pub bus_capacity: usize,

    /// Maximum time to wait for subscriber queues to drain on shutdown.
    pub grace: Duration,
}

impl Config {
    /// Returns the scan interval clamped to at least 1 ms.
    #[inline]
    pub fn scan_interval_clamped(&self) -> Duration {
        self.scan_interval.max(Duration::from_millis(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `scan_interval = 1s`
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(1000),
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}
