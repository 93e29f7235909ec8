//! Smart device capability

use smartdev_protocol::{ParamLayout, ParamMap, ParamTable};

/// Trait for the hardware behind a smart device
///
/// Every method takes `&self` because the same device is shared between
/// the device loop and the watchdog, which may call [`disable`] from an
/// interrupt. Implementations keep their mutable state behind
/// `critical_section::Mutex` or atomics.
///
/// [`disable`]: SmartDevice::disable
pub trait SmartDevice {
    /// Initialize the hardware
    ///
    /// Called once before the first message is served.
    fn setup(&self);

    /// Declare the device's parameters
    ///
    /// One entry per parameter: `Some(size)` for a parameter with backing
    /// storage of `size` bytes, `None` for a slot without.
    fn get_parameters(&self) -> ParamLayout;

    /// Refresh parameters from the hardware
    ///
    /// Writes the current value of each requested parameter into `params`
    /// and returns the map of parameters actually read.
    fn read(&self, present: ParamMap, params: &mut ParamTable) -> ParamMap;

    /// Apply parameter values to the hardware
    ///
    /// Returns the map of parameters actually written. The default device
    /// has no writable parameters.
    fn write(&self, present: ParamMap, params: &ParamTable) -> ParamMap {
        let _ = (present, params);
        ParamMap::EMPTY
    }

    /// Put the hardware in a safe state
    ///
    /// Must be safe to call from interrupt context and at any time.
    fn disable(&self) {}
}
