//! GPIO spokes
//!
//! Digital inputs and outputs over embedded-hal 1.0 pins. Both expose a
//! single `bool` parameter holding the logical level.

use embedded_hal::digital::{InputPin, OutputPin};

use super::Spoke;

/// Read-only digital input (switch, limit sensor)
pub struct DigitalInput<P> {
    pin: P,
    /// If true, logical on = pin LOW
    inverted: bool,
}

impl<P: InputPin> DigitalInput<P> {
    /// Create a new digital input
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to sample
    /// - `inverted`: If true, the input reads true when the pin is LOW
    pub fn new(pin: P, inverted: bool) -> Self {
        Self { pin, inverted }
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }
}

impl<P: InputPin> Spoke for DigitalInput<P> {
    type Value = bool;

    fn read(&mut self) -> Option<bool> {
        self.pin.is_high().ok().map(|high| high != self.inverted)
    }
}

/// Writable digital output (relay, LED, MOSFET)
///
/// Starts off and returns to off when disabled.
pub struct DigitalOutput<P> {
    pin: P,
    /// If true, logical on = pin LOW
    inverted: bool,
    /// Current logical state
    on: bool,
}

impl<P: OutputPin> DigitalOutput<P> {
    /// Create a new digital output, driven off
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to drive
    /// - `inverted`: If true, the output is on when the pin is LOW
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut output = Self {
            pin,
            inverted,
            on: true,
        };
        output.set(false);
        output
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    fn set(&mut self, on: bool) -> bool {
        let result = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_ok() {
            self.on = on;
        }
        result.is_ok()
    }
}

impl<P: OutputPin> Spoke for DigitalOutput<P> {
    type Value = bool;

    fn setup(&mut self) {
        self.set(false);
    }

    fn read(&mut self) -> Option<bool> {
        Some(self.on)
    }

    fn write(&mut self, value: bool) -> bool {
        self.set(value)
    }

    fn disable(&mut self) {
        self.set(false);
    }
}

/// Either kind of digital spoke, so one hub can mix inputs and outputs
pub enum DigitalPin<I, O> {
    Input(DigitalInput<I>),
    Output(DigitalOutput<O>),
}

impl<I: InputPin, O: OutputPin> Spoke for DigitalPin<I, O> {
    type Value = bool;

    fn setup(&mut self) {
        match self {
            Self::Input(input) => input.setup(),
            Self::Output(output) => output.setup(),
        }
    }

    fn read(&mut self) -> Option<bool> {
        match self {
            Self::Input(input) => input.read(),
            Self::Output(output) => output.read(),
        }
    }

    fn write(&mut self, value: bool) -> bool {
        match self {
            Self::Input(input) => input.write(value),
            Self::Output(output) => output.write(value),
        }
    }

    fn disable(&mut self) {
        match self {
            Self::Input(input) => input.disable(),
            Self::Output(output) => output.disable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Hub;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use smartdev_core::SmartDevice;
    use smartdev_protocol::{ParamMap, ParamTable};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Mock GPIO pin whose level is visible from the test
    #[derive(Clone, Default)]
    struct MockPin {
        high: Rc<Cell<bool>>,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high.get())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high.get())
        }
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high.set(true);
            Ok(())
        }
    }

    #[test]
    fn test_input_levels() {
        let pin = MockPin::default();
        let mut input = DigitalInput::new_active_high(pin.clone());
        assert_eq!(input.read(), Some(false));
        pin.high.set(true);
        assert_eq!(input.read(), Some(true));

        // Inputs cannot be written
        assert!(!input.write(false));
        assert!(pin.high.get());
    }

    #[test]
    fn test_active_low_input() {
        let pin = MockPin::default();
        let mut input = DigitalInput::new_active_low(pin.clone());
        assert_eq!(input.read(), Some(true));
        pin.high.set(true);
        assert_eq!(input.read(), Some(false));
    }

    #[test]
    fn test_output_starts_off() {
        let pin = MockPin::default();
        pin.high.set(true);
        let output = DigitalOutput::new_active_high(pin.clone());
        assert!(!output.is_on());
        assert!(!pin.high.get());

        // Active-low off is pin HIGH
        let inverted = MockPin::default();
        let _output = DigitalOutput::new_active_low(inverted.clone());
        assert!(inverted.high.get());
    }

    #[test]
    fn test_output_write_and_disable() {
        let pin = MockPin::default();
        let mut output = DigitalOutput::new_active_high(pin.clone());

        assert!(output.write(true));
        assert_eq!(output.read(), Some(true));
        assert!(pin.high.get());

        output.disable();
        assert_eq!(output.read(), Some(false));
        assert!(!pin.high.get());
    }

    #[test]
    fn test_mixed_hub() {
        let button = MockPin::default();
        let led = MockPin::default();
        let hub: Hub<DigitalPin<MockPin, MockPin>, 2> = Hub::new([
            DigitalPin::Input(DigitalInput::new_active_high(button.clone())),
            DigitalPin::Output(DigitalOutput::new_active_high(led.clone())),
        ]);
        hub.setup();
        let mut params = ParamTable::new(&hub.get_parameters()).unwrap();

        button.high.set(true);
        assert_eq!(hub.read(ParamMap::first(2), &mut params), ParamMap::first(2));
        assert_eq!(params.load::<bool>(0), Some(true));
        assert_eq!(params.load::<bool>(1), Some(false));

        params.store(0, false);
        params.store(1, true);
        assert_eq!(hub.write(ParamMap::first(2), &params), ParamMap::single(1));
        assert!(led.high.get());
        assert!(button.high.get());

        // Watchdog path
        hub.disable();
        assert!(!led.high.get());
    }
}
