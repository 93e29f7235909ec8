//! Smart Device Hardware Abstraction Layer
//!
//! This crate defines the two pieces of hardware the device loop cannot
//! live without: a byte-stream serial port and a monotonic millisecond
//! clock. Chip-specific firmware implements them; host tests implement
//! them with simulated time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  smartdev-core (device loop, watchdog)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  smartdev-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  smartdev-    │       │  simulated    │
//! │  firmware     │       │  (tests)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`serial::SerialPort`] - Delimited frame transport
//! - [`clock::Clock`] - Monotonic time and passive delays

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod serial;

pub use clock::Clock;
pub use serial::{SerialPort, DEFAULT_BAUD_RATE};
