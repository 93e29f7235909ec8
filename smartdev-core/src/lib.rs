//! Board-agnostic core logic for smart devices
//!
//! This crate contains everything a smart device needs to talk to its
//! host that does not depend on specific hardware:
//!
//! - Device capability trait
//! - Device loop (request dispatch, subscriptions, heartbeats)
//! - Cooperative scheduler
//! - Link watchdog
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub(crate) mod log;

pub mod config;
pub mod device;
pub mod safety;
pub mod scheduler;
pub mod traits;

pub use config::LoopConfig;
pub use device::{DeviceLoop, Recv, SerialHandler, HEARTBEAT_ID};
pub use safety::{Liveness, Watchdog};
pub use scheduler::{select, Task, MAX_INTERVAL};
pub use traits::SmartDevice;
