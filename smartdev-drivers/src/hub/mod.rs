//! Hub device
//!
//! A hub exposes `N` identical spokes as parameters `0..N`, one value per
//! spoke. Spokes live behind a critical-section mutex so the watchdog can
//! disable them from interrupt context while the device loop is running.

pub mod digital;

use core::cell::RefCell;

use critical_section::Mutex;
use smartdev_core::SmartDevice;
use smartdev_protocol::{Param, ParamLayout, ParamMap, ParamTable, MAX_PARAMETERS};

pub use digital::{DigitalInput, DigitalOutput, DigitalPin};

/// One peripheral attached to a hub
pub trait Spoke {
    /// Parameter value type
    type Value: Param;

    /// Initialize the peripheral
    fn setup(&mut self) {}

    /// Sample the current value, or `None` if it could not be read
    fn read(&mut self) -> Option<Self::Value>;

    /// Apply a value; returns true if it took effect
    ///
    /// Read-only spokes keep the default, which rejects every write.
    fn write(&mut self, value: Self::Value) -> bool {
        let _ = value;
        false
    }

    /// Put the peripheral in a safe state
    fn disable(&mut self) {}
}

/// Smart device made of `N` spokes
///
/// Only the first [`MAX_PARAMETERS`] spokes are addressable.
pub struct Hub<S, const N: usize> {
    spokes: Mutex<RefCell<[S; N]>>,
}

impl<S: Spoke, const N: usize> Hub<S, N> {
    pub const fn new(spokes: [S; N]) -> Self {
        Self {
            spokes: Mutex::new(RefCell::new(spokes)),
        }
    }

    /// Number of spokes
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Run `f` on spoke `index` inside a critical section
    pub fn with_spoke<R>(&self, index: usize, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        critical_section::with(|cs| {
            let mut spokes = self.spokes.borrow_ref_mut(cs);
            spokes.get_mut(index).map(f)
        })
    }
}

impl<S: Spoke, const N: usize> SmartDevice for Hub<S, N> {
    fn setup(&self) {
        critical_section::with(|cs| {
            for spoke in self.spokes.borrow_ref_mut(cs).iter_mut() {
                spoke.setup();
            }
        });
    }

    fn get_parameters(&self) -> ParamLayout {
        let mut layout = ParamLayout::new();
        for _ in 0..N.min(MAX_PARAMETERS) {
            // Capacity is MAX_PARAMETERS, so this cannot fail
            let _ = layout.push(Some(S::Value::SIZE));
        }
        layout
    }

    fn read(&self, present: ParamMap, params: &mut ParamTable) -> ParamMap {
        critical_section::with(|cs| {
            let mut spokes = self.spokes.borrow_ref_mut(cs);
            let mut read = ParamMap::EMPTY;
            for index in present {
                let Some(spoke) = spokes.get_mut(index) else {
                    continue;
                };
                if let Some(value) = spoke.read() {
                    if params.store(index, value) {
                        read.insert(index);
                    }
                }
            }
            read
        })
    }

    fn write(&self, present: ParamMap, params: &ParamTable) -> ParamMap {
        critical_section::with(|cs| {
            let mut spokes = self.spokes.borrow_ref_mut(cs);
            let mut written = ParamMap::EMPTY;
            for index in present {
                let value = params.load::<S::Value>(index);
                let (Some(spoke), Some(value)) = (spokes.get_mut(index), value) else {
                    continue;
                };
                if spoke.write(value) {
                    written.insert(index);
                }
            }
            written
        })
    }

    fn disable(&self) {
        critical_section::with(|cs| {
            for spoke in self.spokes.borrow_ref_mut(cs).iter_mut() {
                spoke.disable();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counter spoke: reads return the count, writes set it
    #[derive(Default)]
    struct Counter {
        value: u16,
        setups: u8,
        disabled: bool,
        broken: bool,
    }

    impl Spoke for Counter {
        type Value = u16;

        fn setup(&mut self) {
            self.setups += 1;
        }

        fn read(&mut self) -> Option<u16> {
            (!self.broken).then_some(self.value)
        }

        fn write(&mut self, value: u16) -> bool {
            self.value = value;
            self.disabled = false;
            true
        }

        fn disable(&mut self) {
            self.disabled = true;
            self.value = 0;
        }
    }

    fn counters(values: [u16; 3]) -> Hub<Counter, 3> {
        Hub::new(values.map(|value| Counter {
            value,
            ..Default::default()
        }))
    }

    #[test]
    fn test_layout_has_one_slot_per_spoke() {
        let hub = counters([0; 3]);
        assert_eq!(hub.get_parameters().as_slice(), &[Some(2), Some(2), Some(2)]);
        assert_eq!(hub.len(), 3);
    }

    #[test]
    fn test_layout_is_capped() {
        let hub: Hub<Counter, 20> = Hub::new(core::array::from_fn(|_| Counter::default()));
        assert_eq!(hub.get_parameters().len(), MAX_PARAMETERS);
    }

    #[test]
    fn test_setup_reaches_every_spoke() {
        let hub = counters([0; 3]);
        hub.setup();
        for index in 0..3 {
            assert_eq!(hub.with_spoke(index, |s| s.setups), Some(1));
        }
        assert_eq!(hub.with_spoke(3, |s| s.setups), None);
    }

    #[test]
    fn test_read_only_requested_spokes() {
        let hub = counters([10, 20, 30]);
        let mut params = ParamTable::new(&hub.get_parameters()).unwrap();

        let read = hub.read(ParamMap::from_bits(0b1101), &mut params);
        assert_eq!(read.bits(), 0b101);
        assert_eq!(params.load::<u16>(0), Some(10));
        assert_eq!(params.load::<u16>(1), Some(0));
        assert_eq!(params.load::<u16>(2), Some(30));
    }

    #[test]
    fn test_failed_reads_are_left_out() {
        let hub = counters([10, 20, 30]);
        hub.with_spoke(1, |s| s.broken = true);
        let mut params = ParamTable::new(&hub.get_parameters()).unwrap();

        let read = hub.read(ParamMap::first(3), &mut params);
        assert_eq!(read.bits(), 0b101);
    }

    #[test]
    fn test_write_applies_values() {
        let hub = counters([0; 3]);
        let mut params = ParamTable::new(&hub.get_parameters()).unwrap();
        params.store(1, 0xBEEFu16);
        params.store(2, 7u16);

        let written = hub.write(ParamMap::single(1), &params);
        assert_eq!(written, ParamMap::single(1));
        assert_eq!(hub.with_spoke(1, |s| s.value), Some(0xBEEF));
        assert_eq!(hub.with_spoke(2, |s| s.value), Some(0));
    }

    #[test]
    fn test_disable_reaches_every_spoke() {
        let hub = counters([1, 2, 3]);
        hub.disable();
        for index in 0..3 {
            assert_eq!(hub.with_spoke(index, |s| (s.disabled, s.value)), Some((true, 0)));
        }
    }
}
