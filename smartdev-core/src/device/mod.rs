//! Device loop
//!
//! Serves the host over a serial link: answers requests, pushes
//! subscribed parameters and sends heartbeats.

pub mod device_loop;
pub mod serial;

pub use device_loop::{DeviceLoop, HEARTBEAT_ID};
pub use serial::{Recv, SerialHandler};
