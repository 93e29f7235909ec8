//! Monotonic clock abstraction

/// Millisecond time source
///
/// `now_ms` must never go backwards. Timestamps are 64-bit so wraparound
/// is not a concern for the lifetime of a device.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch (usually boot)
    fn now_ms(&self) -> u64;

    /// Wait for `ms` milliseconds without doing anything else
    fn delay_ms(&mut self, ms: u64);
}
