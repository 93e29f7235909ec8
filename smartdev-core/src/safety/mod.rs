//! Safety monitoring
//!
//! Disables the device when the host goes quiet.

pub mod watchdog;

pub use watchdog::{Liveness, Watchdog};
