//! Device capability traits
//!
//! These traits define the interface between the device loop and the
//! hardware a particular smart device exposes.

pub mod device;

pub use device::SmartDevice;
