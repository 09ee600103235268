//! Hardware abstraction traits for step/direction drivers, limit sensing and time.
//!
//! This module defines the hardware seams that let smart-window run the same
//! motion code on an ESP32 and on a desktop with mock pins.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`StepperPins`] | Step pulse, direction and the optional sleep/enable/reset lines |
//! | [`LimitSensor`] | Normalized "end-stop reached" reading |
//! | [`Clock`] | Monotonic microsecond time source for step scheduling |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For real pins, [`crate::hal::StepDirPins`]
//! wraps any `embedded-hal` output pins; `hal::esp32` builds it from
//! ESP-IDF GPIOs (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use smart_window::traits::{ControlLine, Direction, StepperPins};
//! use smart_window::hal::MockPins;
//!
//! let mut pins = MockPins::new().with_line(ControlLine::Sleep);
//! pins.set_direction(Direction::Clockwise).unwrap();
//! pins.pulse_step().unwrap();
//! pins.set_line(ControlLine::Sleep, true).unwrap();
//!
//! assert_eq!(pins.pulses, 1);
//! assert_eq!(pins.level(ControlLine::Sleep), Some(true));
//! ```

/// Rotation direction of the motor shaft.
///
/// [`Clockwise`](Self::Clockwise) is the direction of increasing step
/// position. Which way the window travels for each direction depends on the
/// wiring and the `inverted` configuration flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Positive step direction.
    Clockwise,
    /// Negative step direction.
    CounterClockwise,
}

impl Direction {
    /// Direction of travel needed to cover a signed step distance.
    ///
    /// Zero maps to [`Clockwise`](Self::Clockwise).
    ///
    /// # Examples
    ///
    /// ```
    /// use smart_window::traits::Direction;
    ///
    /// assert_eq!(Direction::from_steps(12), Direction::Clockwise);
    /// assert_eq!(Direction::from_steps(-3), Direction::CounterClockwise);
    /// ```
    #[inline]
    pub const fn from_steps(steps: i64) -> Self {
        if steps < 0 {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        }
    }

    /// Returns `1` for clockwise and `-1` for counter-clockwise.
    #[inline]
    pub const fn sign(self) -> i64 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    /// Returns the direction as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Clockwise => "cw",
            Direction::CounterClockwise => "ccw",
        }
    }
}

/// Optional control lines of a step/direction driver (A4988, DRV8825, ...).
///
/// A driver board may wire none, some or all of these. A line that is not
/// assigned is never written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ControlLine {
    /// `SLEEP`: high = awake.
    Sleep,
    /// `ENABLE`: high = outputs enabled.
    Enable,
    /// `RESET`: high = released from reset.
    Reset,
}

impl ControlLine {
    /// All optional lines, in the order they are brought up by `enable()`.
    pub const ALL: [ControlLine; 3] = [ControlLine::Enable, ControlLine::Reset, ControlLine::Sleep];

    /// Returns the line name as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ControlLine::Sleep => "sleep",
            ControlLine::Enable => "enable",
            ControlLine::Reset => "reset",
        }
    }
}

/// Step/direction driver interface.
///
/// Implement this trait for the pins wired to your stepper driver. The
/// motion code only ever asks for one step pulse at a time; timing between
/// pulses is decided by [`crate::StepperDriver`].
///
/// # Implementation Notes
///
/// - `pulse_step` must produce a complete pulse (high then low) and return;
///   pulse widths are in the microsecond range
/// - `set_line` on a line the board does not have must be a silent no-op
/// - `delay_ms` is only used for the driver wake-up time in `enable()`
///
/// # Example Implementation
///
/// ```rust,ignore
/// use smart_window::traits::{ControlLine, Direction, StepperPins};
///
/// struct MyPins { /* gpio handles */ }
///
/// impl StepperPins for MyPins {
///     type Error = ();
///
///     fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
///         // Write DIR pin...
///         Ok(())
///     }
///
///     fn pulse_step(&mut self) -> Result<(), ()> {
///         // STEP high, ~1us, STEP low...
///         Ok(())
///     }
///
///     fn has_line(&self, _line: ControlLine) -> bool { false }
///     fn set_line(&mut self, _line: ControlLine, _high: bool) -> Result<(), ()> { Ok(()) }
///     fn release_outputs(&mut self) -> Result<(), ()> { Ok(()) }
///     fn delay_ms(&mut self, _ms: u32) {}
/// }
/// ```
pub trait StepperPins {
    /// Error type for pin operations.
    type Error;

    /// Set the level of the direction pin.
    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error>;

    /// Emit a single step pulse.
    fn pulse_step(&mut self) -> Result<(), Self::Error>;

    /// Returns true if the optional line is wired on this board.
    fn has_line(&self, line: ControlLine) -> bool;

    /// Drive an optional line high or low.
    ///
    /// Does nothing if the line is not wired.
    fn set_line(&mut self, line: ControlLine, high: bool) -> Result<(), Self::Error>;

    /// Pull step and direction low (outputs idle).
    fn release_outputs(&mut self) -> Result<(), Self::Error>;

    /// Block for the given number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// End-stop sensor returning a normalized reading.
///
/// `true` always means "physically triggered", whatever the wiring polarity.
///
/// Implemented for `&mut S`, so a controller may hold a borrowed sensor
/// that the caller keeps ownership of.
pub trait LimitSensor {
    /// Returns true if the end-stop is currently triggered.
    fn is_triggered(&mut self) -> bool;
}

impl<S: LimitSensor + ?Sized> LimitSensor for &mut S {
    #[inline]
    fn is_triggered(&mut self) -> bool {
        (**self).is_triggered()
    }
}

/// Monotonic time source.
///
/// Step scheduling needs microsecond resolution; millisecond time is
/// derived from it.
///
/// # Example
///
/// ```rust
/// use smart_window::traits::Clock;
/// use smart_window::hal::MockClock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_us(), 0);
///
/// clock.advance_us(1500);
/// assert_eq!(clock.now_ms(), 1);
/// ```
pub trait Clock {
    /// Returns current time in microseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_us(&self) -> u64;

    /// Returns current time in milliseconds since the same epoch.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Direction Tests
    // =========================================================================

    #[test]
    fn direction_from_steps() {
        assert_eq!(Direction::from_steps(1), Direction::Clockwise);
        assert_eq!(Direction::from_steps(0), Direction::Clockwise);
        assert_eq!(Direction::from_steps(-1), Direction::CounterClockwise);
        assert_eq!(Direction::from_steps(i64::MIN), Direction::CounterClockwise);
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Clockwise.sign(), 1);
        assert_eq!(Direction::CounterClockwise.sign(), -1);
    }

    #[test]
    fn direction_as_str() {
        assert_eq!(Direction::Clockwise.as_str(), "cw");
        assert_eq!(Direction::CounterClockwise.as_str(), "ccw");
    }

    // =========================================================================
    // ControlLine Tests
    // =========================================================================

    #[test]
    fn control_line_bring_up_order() {
        // Reset is released before the driver is woken
        let reset = ControlLine::ALL.iter().position(|l| *l == ControlLine::Reset);
        let sleep = ControlLine::ALL.iter().position(|l| *l == ControlLine::Sleep);
        assert!(reset < sleep);
    }

    #[test]
    fn control_line_as_str() {
        assert_eq!(ControlLine::Sleep.as_str(), "sleep");
        assert_eq!(ControlLine::Enable.as_str(), "enable");
        assert_eq!(ControlLine::Reset.as_str(), "reset");
    }

    // =========================================================================
    // Blanket Impl Tests
    // =========================================================================

    struct Fixed(bool);

    impl LimitSensor for Fixed {
        fn is_triggered(&mut self) -> bool {
            self.0
        }
    }

    fn read_sensor<S: LimitSensor>(mut sensor: S) -> bool {
        sensor.is_triggered()
    }

    #[test]
    fn limit_sensor_through_mut_ref() {
        let mut sensor = Fixed(true);
        assert!(read_sensor(&mut sensor));
        sensor.0 = false;
        assert!(!read_sensor(&mut sensor));
    }

    struct StaticClock(u64);

    impl Clock for StaticClock {
        fn now_us(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn clock_now_ms_default_impl() {
        let clock = StaticClock(2_999);
        assert_eq!(clock.now_ms(), 2);
    }

    #[test]
    fn clock_through_shared_ref() {
        let clock = StaticClock(42);
        let by_ref = &clock;
        assert_eq!(by_ref.now_us(), 42);
    }
}
