//! End-stop sensing with polarity normalization.
//!
//! A [`LimitSwitch`] wraps one digital input and reports `true` when the
//! switch is physically triggered, whatever the wiring:
//!
//! | Polarity | Pin high | Pin low |
//! |----------|----------|---------|
//! | [`TriggerPolarity::ActiveHigh`] | triggered | clear |
//! | [`TriggerPolarity::ActiveLow`] | clear | triggered |
//!
//! Active-low (switch to ground, pull-up enabled) is the default.
//!
//! A failed pin read is reported as triggered, so a broken sensor stops
//! the motor instead of letting it drive into the frame.
//!
//! # Example
//!
//! ```rust
//! use smart_window::{LimitSwitch, TriggerPolarity};
//! use smart_window::hal::MockInput;
//! use smart_window::traits::LimitSensor;
//!
//! let pin = MockInput::high();
//! let probe = pin.clone();
//! let mut switch = LimitSwitch::new(pin, TriggerPolarity::ActiveLow);
//!
//! assert!(!switch.is_triggered());
//! probe.set_low();
//! assert!(switch.is_triggered());
//! ```

use embedded_hal::digital::InputPin;

use crate::traits::LimitSensor;

/// Pin level that means "triggered".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TriggerPolarity {
    /// Triggered when the pin reads high.
    ActiveHigh,
    /// Triggered when the pin reads low.
    #[default]
    ActiveLow,
}

impl TriggerPolarity {
    /// Maps a physical pin level to the triggered state.
    #[inline]
    pub const fn is_triggered(self, pin_high: bool) -> bool {
        pin_high ^ matches!(self, TriggerPolarity::ActiveLow)
    }
}

/// Kind of end-stop sensing attached to a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorType {
    /// Mechanical or optical switch at each end of travel.
    LimitSwitch,
}

/// Digital end-stop switch.
#[derive(Debug)]
pub struct LimitSwitch<P> {
    pin: P,
    polarity: TriggerPolarity,
}

impl<P: InputPin> LimitSwitch<P> {
    /// Wraps an input pin.
    pub fn new(pin: P, polarity: TriggerPolarity) -> Self {
        Self { pin, polarity }
    }

    /// Wraps an input pin wired active-low.
    pub fn active_low(pin: P) -> Self {
        Self::new(pin, TriggerPolarity::ActiveLow)
    }

    /// Configured polarity.
    pub fn polarity(&self) -> TriggerPolarity {
        self.polarity
    }

    /// Changes the polarity.
    pub fn set_polarity(&mut self, polarity: TriggerPolarity) {
        self.polarity = polarity;
    }

    /// Reads the switch; `true` means triggered.
    ///
    /// A read error counts as triggered.
    pub fn read(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => self.polarity.is_triggered(high),
            Err(e) => {
                log::warn!("limit switch read failed ({:?}), treating as triggered", e);
                true
            }
        }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> LimitSensor for LimitSwitch<P> {
    fn is_triggered(&mut self) -> bool {
        self.read()
    }
}

/// Placeholder sensor for windows without end-stops. Never triggered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSensor;

impl LimitSensor for NoSensor {
    fn is_triggered(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockInput;

    #[test]
    fn polarity_truth_table() {
        assert!(TriggerPolarity::ActiveHigh.is_triggered(true));
        assert!(!TriggerPolarity::ActiveHigh.is_triggered(false));
        assert!(!TriggerPolarity::ActiveLow.is_triggered(true));
        assert!(TriggerPolarity::ActiveLow.is_triggered(false));
    }

    #[test]
    fn default_polarity_is_active_low() {
        assert_eq!(TriggerPolarity::default(), TriggerPolarity::ActiveLow);
    }

    #[test]
    fn active_high_switch() {
        let pin = MockInput::low();
        let probe = pin.clone();
        let mut switch = LimitSwitch::new(pin, TriggerPolarity::ActiveHigh);
        assert!(!switch.read());
        probe.set_high();
        assert!(switch.read());
    }

    #[test]
    fn active_low_switch() {
        let pin = MockInput::low();
        let mut switch = LimitSwitch::active_low(pin);
        assert!(switch.is_triggered());
    }

    #[test]
    fn polarity_can_change() {
        let mut switch = LimitSwitch::active_low(MockInput::high());
        assert!(!switch.read());
        switch.set_polarity(TriggerPolarity::ActiveHigh);
        assert_eq!(switch.polarity(), TriggerPolarity::ActiveHigh);
        assert!(switch.read());
    }

    #[test]
    fn read_error_counts_as_triggered() {
        let pin = MockInput::high();
        pin.set_failing(true);
        let mut switch = LimitSwitch::new(pin, TriggerPolarity::ActiveHigh);
        // High would be triggered anyway; check with a clear level too
        switch.set_polarity(TriggerPolarity::ActiveLow);
        assert!(switch.read());
    }

    #[test]
    fn no_sensor_never_triggers() {
        let mut sensor = NoSensor;
        assert!(!sensor.is_triggered());
    }
}
