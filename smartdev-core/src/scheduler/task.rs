//! Periodic tasks

use smartdev_protocol::Interval;

/// Longest time `select` will let the loop wait (ms)
pub const MAX_INTERVAL: u64 = 1000;

/// A periodic task
///
/// A task does not run anything itself; it only records when it is due.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Task {
    /// Time the task last became ready (ms)
    last: u64,
    /// Period (ms)
    interval: Interval,
    /// Set by `select`, cleared by the consumer
    ready: bool,
}

impl Task {
    /// Create a task whose first period starts at `now`
    pub fn new(interval: Interval, now: u64) -> Self {
        Self {
            last: now,
            interval,
            ready: false,
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    /// Time the task is next due
    pub fn next(&self) -> u64 {
        self.last + u64::from(self.interval)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Return and reset the ready flag
    pub fn clear_ready(&mut self) -> bool {
        core::mem::take(&mut self.ready)
    }

    fn poll(&mut self, now: u64) {
        if now >= self.next() {
            self.last = now;
            self.ready = true;
        }
    }
}

/// Mark due tasks ready and return the next deadline
///
/// The deadline is the earliest `next()` across `tasks`, but never later
/// than `now + MAX_INTERVAL`.
pub fn select(tasks: &mut [&mut Task], now: u64) -> u64 {
    let mut stop = now + MAX_INTERVAL;
    for task in tasks.iter_mut() {
        task.poll(now);
        stop = stop.min(task.next());
    }
    stop
}
