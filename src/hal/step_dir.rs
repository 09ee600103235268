//! [`StepperPins`] over plain `embedded-hal` output pins.
//!
//! Works with any A4988/DRV8825-style driver: STEP and DIR are required,
//! SLEEP, ENABLE and RESET are optional. Unassigned lines use [`NoPin`] and
//! are never written.
//!
//! # Example
//!
//! ```rust,ignore
//! use smart_window::hal::StepDirPins;
//!
//! let pins = StepDirPins::new(step_gpio, dir_gpio, delay)
//!     .with_sleep(sleep_gpio)
//!     .with_pulse_width_us(2);
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, ErrorKind, ErrorType, OutputPin};

use crate::traits::{ControlLine, Direction, StepperPins};

/// Minimum STEP high time for common drivers (A4988: 1us, DRV8825: 1.9us).
pub const DEFAULT_PULSE_WIDTH_US: u32 = 2;

/// Placeholder for an optional line that is not wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Step/direction driver wired to `embedded-hal` pins.
///
/// Pin errors of every concrete type are reported as their
/// [`ErrorKind`].
pub struct StepDirPins<STEP, DIR, SLP = NoPin, EN = NoPin, RST = NoPin, D = NoDelay> {
    step: STEP,
    dir: DIR,
    sleep: Option<SLP>,
    enable: Option<EN>,
    reset: Option<RST>,
    delay: D,
    pulse_width_us: u32,
}

/// Delay that returns immediately; for boards where timing is handled elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

impl<STEP, DIR, D> StepDirPins<STEP, DIR, NoPin, NoPin, NoPin, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
{
    /// Creates pins with only STEP and DIR wired.
    pub fn new(step: STEP, dir: DIR, delay: D) -> Self {
        Self {
            step,
            dir,
            sleep: None,
            enable: None,
            reset: None,
            delay,
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
        }
    }
}

impl<STEP, DIR, SLP, EN, RST, D> StepDirPins<STEP, DIR, SLP, EN, RST, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    SLP: OutputPin,
    EN: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    /// Creates pins from optional control lines of matching types.
    ///
    /// Used when all GPIOs share one driver type, as on ESP-IDF.
    pub fn from_parts(
        step: STEP,
        dir: DIR,
        sleep: Option<SLP>,
        enable: Option<EN>,
        reset: Option<RST>,
        delay: D,
    ) -> Self {
        Self {
            step,
            dir,
            sleep,
            enable,
            reset,
            delay,
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
        }
    }

    /// Wires the SLEEP line.
    pub fn with_sleep<P: OutputPin>(self, pin: P) -> StepDirPins<STEP, DIR, P, EN, RST, D> {
        StepDirPins {
            step: self.step,
            dir: self.dir,
            sleep: Some(pin),
            enable: self.enable,
            reset: self.reset,
            delay: self.delay,
            pulse_width_us: self.pulse_width_us,
        }
    }

    /// Wires the ENABLE line.
    pub fn with_enable<P: OutputPin>(self, pin: P) -> StepDirPins<STEP, DIR, SLP, P, RST, D> {
        StepDirPins {
            step: self.step,
            dir: self.dir,
            sleep: self.sleep,
            enable: Some(pin),
            reset: self.reset,
            delay: self.delay,
            pulse_width_us: self.pulse_width_us,
        }
    }

    /// Wires the RESET line.
    pub fn with_reset<P: OutputPin>(self, pin: P) -> StepDirPins<STEP, DIR, SLP, EN, P, D> {
        StepDirPins {
            step: self.step,
            dir: self.dir,
            sleep: self.sleep,
            enable: self.enable,
            reset: Some(pin),
            delay: self.delay,
            pulse_width_us: self.pulse_width_us,
        }
    }

    /// Sets the STEP high time in microseconds (minimum 1).
    pub fn with_pulse_width_us(mut self, us: u32) -> Self {
        self.pulse_width_us = us.max(1);
        self
    }

    /// STEP high time in microseconds.
    pub fn pulse_width_us(&self) -> u32 {
        self.pulse_width_us
    }

    /// Consumes the wrapper, returning STEP and DIR.
    pub fn release(self) -> (STEP, DIR) {
        (self.step, self.dir)
    }
}

fn write<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), ErrorKind> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|e| e.kind())
}

fn write_optional<P: OutputPin>(pin: &mut Option<P>, high: bool) -> Result<(), ErrorKind> {
    match pin {
        Some(pin) => write(pin, high),
        None => Ok(()),
    }
}

impl<STEP, DIR, SLP, EN, RST, D> StepperPins for StepDirPins<STEP, DIR, SLP, EN, RST, D>
where
    STEP: OutputPin,
    DIR: OutputPin,
    SLP: OutputPin,
    EN: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    type Error = ErrorKind;

    fn set_direction(&mut self, dir: Direction) -> Result<(), ErrorKind> {
        write(&mut self.dir, dir == Direction::Clockwise)
    }

    fn pulse_step(&mut self) -> Result<(), ErrorKind> {
        write(&mut self.step, true)?;
        self.delay.delay_us(self.pulse_width_us);
        write(&mut self.step, false)
    }

    fn has_line(&self, line: ControlLine) -> bool {
        match line {
            ControlLine::Sleep => self.sleep.is_some(),
            ControlLine::Enable => self.enable.is_some(),
            ControlLine::Reset => self.reset.is_some(),
        }
    }

    fn set_line(&mut self, line: ControlLine, high: bool) -> Result<(), ErrorKind> {
        match line {
            ControlLine::Sleep => write_optional(&mut self.sleep, high),
            ControlLine::Enable => write_optional(&mut self.enable, high),
            ControlLine::Reset => write_optional(&mut self.reset, high),
        }
    }

    fn release_outputs(&mut self) -> Result<(), ErrorKind> {
        write(&mut self.step, false)?;
        write(&mut self.dir, false)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
