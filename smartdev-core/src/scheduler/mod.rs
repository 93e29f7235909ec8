//! Cooperative task scheduler
//!
//! Periodic work (heartbeats, subscription updates) is tracked as
//! [`Task`]s. The device loop polls them with [`select`], does whatever
//! became ready, then serves the host until the returned deadline.

pub mod task;

pub use task::{select, Task, MAX_INTERVAL};
