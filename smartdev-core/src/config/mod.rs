//! Configuration types
//!
//! Timing and link settings for the device loop. The defaults match what
//! the host expects from every smart device; boards only override them
//! for testing or unusual links.

use smartdev_hal::serial::DEFAULT_BAUD_RATE;
use smartdev_protocol::Interval;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shortest read timeout worth handing to the serial port (ms)
pub const DEFAULT_MIN_TIMEOUT_MS: u64 = 10;

/// Minimum time spent serving host requests per loop iteration (ms)
pub const DEFAULT_MIN_SERVE_INTERVAL_MS: u64 = 40;

/// Fastest allowed subscription interval (ms)
pub const DEFAULT_MIN_SUB_INTERVAL_MS: Interval = 40;

/// Slowest allowed subscription interval (ms)
pub const DEFAULT_MAX_SUB_INTERVAL_MS: Interval = 250;

/// Watchdog period (ms)
pub const DEFAULT_DISABLE_INTERVAL_MS: u64 = 1000;

/// Heartbeat request period (ms)
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: Interval = 1000;

/// Device loop configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoopConfig {
    /// Serial line speed
    pub baud_rate: u32,
    /// Timeouts below this are slept through instead of read
    pub min_timeout_ms: u64,
    /// Lower bound on each serve window
    pub min_serve_interval_ms: u64,
    /// Subscription intervals are clamped to at least this
    pub min_sub_interval_ms: Interval,
    /// Subscription intervals are clamped to at most this
    pub max_sub_interval_ms: Interval,
    /// Period of the external watchdog timer
    pub disable_interval_ms: u64,
    /// Period of outgoing heartbeat requests
    pub heartbeat_interval_ms: Interval,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            min_timeout_ms: DEFAULT_MIN_TIMEOUT_MS,
            min_serve_interval_ms: DEFAULT_MIN_SERVE_INTERVAL_MS,
            min_sub_interval_ms: DEFAULT_MIN_SUB_INTERVAL_MS,
            max_sub_interval_ms: DEFAULT_MAX_SUB_INTERVAL_MS,
            disable_interval_ms: DEFAULT_DISABLE_INTERVAL_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
        }
    }
}

impl LoopConfig {
    /// Clamp a requested subscription interval into the allowed range
    ///
    /// Zero means "unsubscribe" and is passed through unchanged. If the
    /// bounds are inverted the maximum wins.
    pub fn clamp_interval(&self, interval: Interval) -> Interval {
        if interval == smartdev_protocol::NO_SUBSCRIPTION {
            return interval;
        }
        interval
            .max(self.min_sub_interval_ms)
            .min(self.max_sub_interval_ms)
    }
}
