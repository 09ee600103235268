//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware traits, enabling
//! development and testing on desktop without a motor or switches attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPins`] | [`StepperPins`] | Counts pulses, tracks direction and line levels |
//! | [`MockClock`] | [`Clock`] | Controllable (optionally self-advancing) time source |
//! | [`MockInput`] | `embedded_hal::digital::InputPin` | Shared, settable input level |
//!
//! # Example
//!
//! ```rust
//! use smart_window::{WindowConfig, WindowController, WindowState};
//! use smart_window::hal::{MockClock, MockPins};
//!
//! let clock = MockClock::ticking(50);
//! let config = WindowConfig::default().with_length(10.0);
//! let mut window = WindowController::new(&config, MockPins::new(), &clock).unwrap();
//!
//! window.open();
//! while window.run().unwrap() {}
//!
//! assert_eq!(window.state(), WindowState::Idle);
//! assert!(window.actuator().driver().pins().pulses > 0);
//! ```
//!
//! [`StepperPins`]: crate::traits::StepperPins
//! [`Clock`]: crate::traits::Clock

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use crate::traits::{Clock, ControlLine, Direction, StepperPins};

// ============================================================================
// Stepper Mocks
// ============================================================================

/// Mock step/direction pins for testing.
///
/// Records every pulse and line write for verification. Use the public
/// fields to inspect state after test operations.
///
/// Only lines added with [`with_line`](Self::with_line) are reported as
/// wired; writes to other lines are still logged in `line_writes` so tests
/// can assert they never happen.
///
/// # Example
///
/// ```rust
/// use smart_window::hal::MockPins;
/// use smart_window::traits::{Direction, StepperPins};
///
/// let mut pins = MockPins::new();
/// pins.set_direction(Direction::CounterClockwise).unwrap();
/// pins.pulse_step().unwrap();
/// pins.pulse_step().unwrap();
///
/// assert_eq!(pins.pulses, 2);
/// assert_eq!(pins.position, -2);
/// ```
#[derive(Debug, Default)]
pub struct MockPins {
    /// Total number of step pulses emitted.
    pub pulses: u64,
    /// Net signed step count (clockwise positive).
    pub position: i64,
    /// Last direction written.
    pub direction: Option<Direction>,
    /// Every `set_line` call, in order, wired or not.
    pub line_writes: Vec<(ControlLine, bool)>,
    /// Every `delay_ms` call.
    pub delays_ms: Vec<u32>,
    /// Number of times `release_outputs` was called.
    pub releases: usize,
    sleep: Option<bool>,
    enable: Option<bool>,
    reset: Option<bool>,
    wired: [bool; 3],
}

impl MockPins {
    /// Creates mock pins with only STEP and DIR wired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates mock pins with every optional line wired.
    pub fn fully_wired() -> Self {
        Self::new()
            .with_line(ControlLine::Sleep)
            .with_line(ControlLine::Enable)
            .with_line(ControlLine::Reset)
    }

    /// Marks an optional line as wired.
    pub fn with_line(mut self, line: ControlLine) -> Self {
        self.wired[Self::index(line)] = true;
        self
    }

    /// Current level of a wired line, or `None` if unwired or never written.
    pub fn level(&self, line: ControlLine) -> Option<bool> {
        match line {
            ControlLine::Sleep => self.sleep,
            ControlLine::Enable => self.enable,
            ControlLine::Reset => self.reset,
        }
    }

    /// Number of writes to a line, wired or not.
    pub fn writes_to(&self, line: ControlLine) -> usize {
        self.line_writes.iter().filter(|(l, _)| *l == line).count()
    }

    fn index(line: ControlLine) -> usize {
        match line {
            ControlLine::Sleep => 0,
            ControlLine::Enable => 1,
            ControlLine::Reset => 2,
        }
    }
}

impl StepperPins for MockPins {
    type Error = Infallible;

    fn set_direction(&mut self, dir: Direction) -> Result<(), Infallible> {
        self.direction = Some(dir);
        Ok(())
    }

    fn pulse_step(&mut self) -> Result<(), Infallible> {
        self.pulses += 1;
        self.position += self.direction.unwrap_or(Direction::Clockwise).sign();
        Ok(())
    }

    fn has_line(&self, line: ControlLine) -> bool {
        self.wired[Self::index(line)]
    }

    fn set_line(&mut self, line: ControlLine, high: bool) -> Result<(), Infallible> {
        self.line_writes.push((line, high));
        if !self.has_line(line) {
            return Ok(());
        }
        match line {
            ControlLine::Sleep => self.sleep = Some(high),
            ControlLine::Enable => self.enable = Some(high),
            ControlLine::Reset => self.reset = Some(high),
        }
        Ok(())
    }

    fn release_outputs(&mut self) -> Result<(), Infallible> {
        self.releases += 1;
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

/// Mock pins whose every operation fails.
///
/// Used to check that pin errors propagate out of `run()` and `enable()`.
#[derive(Debug, Default)]
pub struct FailingPins;

impl StepperPins for FailingPins {
    type Error = ErrorKind;

    fn set_direction(&mut self, _dir: Direction) -> Result<(), ErrorKind> {
        Err(ErrorKind::Other)
    }

    fn pulse_step(&mut self) -> Result<(), ErrorKind> {
        Err(ErrorKind::Other)
    }

    fn has_line(&self, _line: ControlLine) -> bool {
        true
    }

    fn set_line(&mut self, _line: ControlLine, _high: bool) -> Result<(), ErrorKind> {
        Err(ErrorKind::Other)
    }

    fn release_outputs(&mut self) -> Result<(), ErrorKind> {
        Err(ErrorKind::Other)
    }

    fn delay_ms(&mut self, _ms: u32) {}
}

/// Mock clock for testing.
///
/// Provides a controllable microsecond time source. A clock built with
/// [`ticking`](Self::ticking) advances itself on every read, so a plain
/// `while window.run()? {}` loop makes progress.
///
/// Interior mutability lets tests advance the clock while a driver holds a
/// shared reference to it.
///
/// # Example
///
/// ```rust
/// use smart_window::hal::MockClock;
/// use smart_window::traits::Clock;
///
/// let clock = MockClock::new();
/// clock.set_us(1_000);
/// clock.advance_ms(2);
/// assert_eq!(clock.now_us(), 3_000);
///
/// let ticking = MockClock::ticking(10);
/// assert_eq!(ticking.now_us(), 0);
/// assert_eq!(ticking.now_us(), 10);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_us: Cell<u64>,
    tick_us: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0us.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock that advances by `tick_us` after every read.
    pub fn ticking(tick_us: u64) -> Self {
        Self {
            current_us: Cell::new(0),
            tick_us,
        }
    }

    /// Sets the current time in microseconds.
    pub fn set_us(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the clock by the given number of microseconds.
    pub fn advance_us(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        let now = self.current_us.get();
        self.current_us.set(now + self.tick_us);
        now
    }
}

// ============================================================================
// Input Mocks
// ============================================================================

/// Mock digital input for testing limit switches.
///
/// Clones share the same level, so a test can keep one handle and flip the
/// input while a controller owns the other.
///
/// # Example
///
/// ```rust
/// use embedded_hal::digital::InputPin;
/// use smart_window::hal::MockInput;
///
/// let mut pin = MockInput::high();
/// let probe = pin.clone();
///
/// assert!(pin.is_high().unwrap());
/// probe.set_low();
/// assert!(pin.is_low().unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockInput {
    level: Rc<Cell<bool>>,
    failing: Rc<Cell<bool>>,
    reads: Rc<Cell<usize>>,
}

impl MockInput {
    /// Creates an input reading low.
    pub fn low() -> Self {
        Self::default()
    }

    /// Creates an input reading high.
    pub fn high() -> Self {
        let pin = Self::default();
        pin.set_high();
        pin
    }

    /// Drives the simulated level high.
    pub fn set_high(&self) {
        self.level.set(true);
    }

    /// Drives the simulated level low.
    pub fn set_low(&self) {
        self.level.set(false);
    }

    /// Makes subsequent reads fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Number of reads performed through any clone.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    fn read(&self) -> Result<bool, ErrorKind> {
        self.reads.set(self.reads.get() + 1);
        if self.failing.get() {
            Err(ErrorKind::Other)
        } else {
            Ok(self.level.get())
        }
    }
}

impl ErrorType for MockInput {
    type Error = ErrorKind;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, ErrorKind> {
        self.read()
    }

    fn is_low(&mut self) -> Result<bool, ErrorKind> {
        self.read().map(|high| !high)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MockPins Tests
    // =========================================================================

    #[test]
    fn mock_pins_default() {
        let pins = MockPins::new();
        assert_eq!(pins.pulses, 0);
        assert_eq!(pins.position, 0);
        assert!(pins.direction.is_none());
        assert!(!pins.has_line(ControlLine::Sleep));
        assert!(!pins.has_line(ControlLine::Enable));
        assert!(!pins.has_line(ControlLine::Reset));
    }

    #[test]
    fn mock_pins_track_position() {
        let mut pins = MockPins::new();
        pins.set_direction(Direction::Clockwise).unwrap();
        for _ in 0..5 {
            pins.pulse_step().unwrap();
        }
        pins.set_direction(Direction::CounterClockwise).unwrap();
        pins.pulse_step().unwrap();

        assert_eq!(pins.pulses, 6);
        assert_eq!(pins.position, 4);
        assert_eq!(pins.direction, Some(Direction::CounterClockwise));
    }

    #[test]
    fn mock_pins_unwired_line_logged_but_not_driven() {
        let mut pins = MockPins::new().with_line(ControlLine::Sleep);
        pins.set_line(ControlLine::Reset, true).unwrap();
        pins.set_line(ControlLine::Sleep, true).unwrap();

        assert_eq!(pins.level(ControlLine::Reset), None);
        assert_eq!(pins.level(ControlLine::Sleep), Some(true));
        assert_eq!(pins.writes_to(ControlLine::Reset), 1);
    }

    #[test]
    fn mock_pins_fully_wired() {
        let pins = MockPins::fully_wired();
        for line in ControlLine::ALL {
            assert!(pins.has_line(line));
        }
    }

    #[test]
    fn failing_pins_error() {
        let mut pins = FailingPins;
        assert_eq!(pins.pulse_step(), Err(ErrorKind::Other));
    }

    // =========================================================================
    // MockClock Tests
    // =========================================================================

    #[test]
    fn mock_clock_default() {
        let clock = MockClock::new();
        assert_eq!(clock.now_us(), 0);
        assert_eq!(clock.now_us(), 0);
    }

    #[test]
    fn mock_clock_set_and_advance() {
        let clock = MockClock::new();
        clock.set_us(1_000);
        clock.advance_us(500);
        assert_eq!(clock.now_us(), 1_500);
        clock.advance_ms(1);
        assert_eq!(clock.now_ms(), 2);
    }

    #[test]
    fn mock_clock_ticking() {
        let clock = MockClock::ticking(25);
        assert_eq!(clock.now_us(), 0);
        assert_eq!(clock.now_us(), 25);
        clock.advance_us(100);
        assert_eq!(clock.now_us(), 150);
    }

    // =========================================================================
    // MockInput Tests
    // =========================================================================

    #[test]
    fn mock_input_clones_share_level() {
        let mut pin = MockInput::low();
        let probe = pin.clone();
        assert!(!pin.is_high().unwrap());

        probe.set_high();
        assert!(pin.is_high().unwrap());
        assert_eq!(probe.reads(), 2);
    }

    #[test]
    fn mock_input_failing() {
        let mut pin = MockInput::high();
        pin.set_failing(true);
        assert!(pin.is_high().is_err());
        pin.set_failing(false);
        assert!(pin.is_high().unwrap());
    }
}
