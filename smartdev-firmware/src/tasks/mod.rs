//! Embassy async tasks
//!
//! The device loop itself is blocking and runs from `main`; only the
//! watchdog runs as a task, on a higher-priority interrupt executor.

pub mod watchdog;

pub use watchdog::watchdog_task;
