//! Non-blocking stepper driver with angular units.
//!
//! [`StepperDriver`] turns angles into step schedules. It owns the pins, the
//! clock and an [`AccelRamp`], and exposes speeds and angles in the active
//! [`AngleUnit`].
//!
//! # Units
//!
//! The profile is held in radians and converted on the way in and out, so
//! switching units never changes the physical speed:
//!
//! ```text
//! steps_per_unit = steps_per_revolution / full_turn     (360 or 2π)
//! ```
//!
//! # Polling
//!
//! [`StepperDriver::run`] takes at most one step per call. Call it at least
//! as often as the fastest step rate (1 / max speed in steps/s) or steps are
//! lost to the schedule.
//!
//! # Example
//!
//! ```rust
//! use smart_window::{AngleUnit, MotionProfile, StepperDriver};
//! use smart_window::hal::{MockClock, MockPins};
//!
//! let clock = MockClock::ticking(20);
//! let mut driver = StepperDriver::new(MockPins::new(), &clock, MotionProfile::default()).unwrap();
//!
//! driver.enable().unwrap();
//! driver.rotate(90.0);
//! driver.blocking_run().unwrap();
//!
//! assert_eq!(driver.position_steps(), 50);
//! assert!((driver.position() - 90.0).abs() < 1e-3);
//!
//! driver.set_unit(AngleUnit::Radian);
//! assert!((driver.position() - core::f32::consts::FRAC_PI_2).abs() < 1e-4);
//! ```

use core::f32::consts::{PI, TAU};

use crate::config::ConfigError;
use crate::ramp::AccelRamp;
use crate::traits::{Clock, ControlLine, Direction, StepperPins};

/// Time the driver needs after leaving sleep before it accepts steps.
pub const WAKE_DELAY_MS: u32 = 2;

// ============================================================================
// Units and profile
// ============================================================================

/// Unit of every angle-valued input and output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AngleUnit {
    /// 360 per turn.
    #[default]
    Degree,
    /// 2π per turn.
    Radian,
}

impl AngleUnit {
    /// Size of one full revolution in this unit.
    #[inline]
    pub const fn full_turn(self) -> f32 {
        match self {
            AngleUnit::Degree => 360.0,
            AngleUnit::Radian => TAU,
        }
    }

    /// Convert a value in this unit to radians.
    #[inline]
    pub fn to_radians(self, value: f32) -> f32 {
        match self {
            AngleUnit::Degree => value * (PI / 180.0),
            AngleUnit::Radian => value,
        }
    }

    /// Convert a value in radians to this unit.
    #[inline]
    pub fn from_radians(self, radians: f32) -> f32 {
        match self {
            AngleUnit::Degree => radians * (180.0 / PI),
            AngleUnit::Radian => radians,
        }
    }

    /// Returns the unit as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AngleUnit::Degree => "deg",
            AngleUnit::Radian => "rad",
        }
    }
}

/// Speed limits and resolution of a motor, in one angle unit.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionProfile {
    /// Cruise speed (unit/s)
    pub max_speed: f32,
    /// Acceleration (unit/s²); the sign is ignored
    pub acceleration: f32,
    /// Steps per motor revolution
    pub steps_per_revolution: u32,
    /// Unit of `max_speed` and `acceleration`
    pub unit: AngleUnit,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            max_speed: 1080.0,
            acceleration: 360.0,
            steps_per_revolution: 200,
            unit: AngleUnit::Degree,
        }
    }
}

impl MotionProfile {
    /// Check that every field can drive a motor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_revolution == 0 {
            return Err(ConfigError::ZeroStepsPerRevolution);
        }
        check_rate(self.max_speed, ConfigError::InvalidMaxSpeed)?;
        check_rate(self.acceleration, ConfigError::InvalidAcceleration)?;
        Ok(())
    }
}

fn check_rate(value: f32, err: ConfigError) -> Result<f32, ConfigError> {
    let magnitude = libm::fabsf(value);
    if magnitude.is_finite() && magnitude > 0.0 {
        Ok(magnitude)
    } else {
        Err(err)
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Stepper motor on a step/direction driver.
pub struct StepperDriver<P, C> {
    pins: P,
    clock: C,
    ramp: AccelRamp,
    unit: AngleUnit,
    steps_per_revolution: u32,
    max_speed_rad: f32,
    acceleration_rad: f32,
    enabled: bool,
}

impl<P: StepperPins, C: Clock> StepperDriver<P, C> {
    /// Create a driver from a validated profile.
    ///
    /// The driver starts disabled; call [`enable`](Self::enable) before
    /// moving. The active unit is the profile's unit.
    pub fn new(pins: P, clock: C, profile: MotionProfile) -> Result<Self, ConfigError> {
        let mut driver = Self {
            pins,
            clock,
            ramp: AccelRamp::new(1.0, 1.0),
            unit: profile.unit,
            steps_per_revolution: 1,
            max_speed_rad: 1.0,
            acceleration_rad: 1.0,
            enabled: false,
        };
        driver.set_profile(profile)?;
        Ok(driver)
    }

    /// Replace speed, acceleration and resolution in one go.
    ///
    /// The profile is validated first; on error nothing changes. The
    /// active unit is left as it is.
    pub fn set_profile(&mut self, profile: MotionProfile) -> Result<(), ConfigError> {
        profile.validate()?;
        self.steps_per_revolution = profile.steps_per_revolution;
        self.max_speed_rad = profile.unit.to_radians(libm::fabsf(profile.max_speed));
        self.acceleration_rad = profile.unit.to_radians(libm::fabsf(profile.acceleration));
        self.apply_profile();
        Ok(())
    }

    /// Current profile expressed in the active unit.
    pub fn profile(&self) -> MotionProfile {
        MotionProfile {
            max_speed: self.max_speed(),
            acceleration: self.acceleration(),
            steps_per_revolution: self.steps_per_revolution,
            unit: self.unit,
        }
    }

    /// Wake the driver.
    ///
    /// ENABLE high, RESET released, then SLEEP high followed by
    /// [`WAKE_DELAY_MS`]. Unwired lines are skipped. Safe to call repeatedly.
    pub fn enable(&mut self) -> Result<(), P::Error> {
        for line in ControlLine::ALL {
            if self.write_line(line, true)? && line == ControlLine::Sleep {
                self.pins.delay_ms(WAKE_DELAY_MS);
            }
        }
        if !self.enabled {
            log::info!("stepper enabled");
        }
        self.enabled = true;
        Ok(())
    }

    /// Put the driver to sleep.
    ///
    /// RESET asserted, SLEEP low, STEP/DIR released, ENABLE low. Safe to
    /// call repeatedly.
    pub fn disable(&mut self) -> Result<(), P::Error> {
        self.write_line(ControlLine::Reset, false)?;
        self.write_line(ControlLine::Sleep, false)?;
        self.pins.release_outputs()?;
        self.write_line(ControlLine::Enable, false)?;
        if self.enabled {
            log::info!("stepper disabled");
        }
        self.enabled = false;
        Ok(())
    }

    /// Returns whether the line is wired.
    fn write_line(&mut self, line: ControlLine, high: bool) -> Result<bool, P::Error> {
        if !self.pins.has_line(line) {
            return Ok(false);
        }
        log::trace!("{} {}", line.as_str(), if high { "high" } else { "low" });
        self.pins.set_line(line, high)?;
        Ok(true)
    }

    /// True between `enable()` and `disable()`.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Change the unit of angle-valued inputs and outputs.
    ///
    /// A move already scheduled keeps its step target.
    pub fn set_unit(&mut self, unit: AngleUnit) {
        self.unit = unit;
    }

    /// Active angle unit.
    #[inline]
    pub fn unit(&self) -> AngleUnit {
        self.unit
    }

    /// Set the cruise speed in the active unit per second.
    pub fn set_max_speed(&mut self, speed: f32) -> Result<(), ConfigError> {
        let speed = check_rate(speed, ConfigError::InvalidMaxSpeed)?;
        self.max_speed_rad = self.unit.to_radians(speed);
        self.apply_profile();
        Ok(())
    }

    /// Cruise speed in the active unit per second.
    pub fn max_speed(&self) -> f32 {
        self.unit.from_radians(self.max_speed_rad)
    }

    /// Set the acceleration in the active unit per second². The sign is ignored.
    pub fn set_acceleration(&mut self, acceleration: f32) -> Result<(), ConfigError> {
        let acceleration = check_rate(acceleration, ConfigError::InvalidAcceleration)?;
        self.acceleration_rad = self.unit.to_radians(acceleration);
        self.apply_profile();
        Ok(())
    }

    /// Acceleration in the active unit per second².
    pub fn acceleration(&self) -> f32 {
        self.unit.from_radians(self.acceleration_rad)
    }

    /// Steps per motor revolution.
    #[inline]
    pub fn steps_per_revolution(&self) -> u32 {
        self.steps_per_revolution
    }

    /// Change the motor resolution, keeping the angular speed and acceleration.
    pub fn set_steps_per_revolution(&mut self, steps: u32) -> Result<(), ConfigError> {
        if steps == 0 {
            return Err(ConfigError::ZeroStepsPerRevolution);
        }
        self.steps_per_revolution = steps;
        self.apply_profile();
        Ok(())
    }

    /// Number of steps in one `unit`.
    #[inline]
    pub fn steps_per(&self, unit: AngleUnit) -> f32 {
        self.steps_per_revolution as f32 / unit.full_turn()
    }

    fn apply_profile(&mut self) {
        let steps_per_rad = self.steps_per(AngleUnit::Radian);
        self.ramp.set_max_speed(self.max_speed_rad * steps_per_rad);
        self.ramp.set_acceleration(self.acceleration_rad * steps_per_rad);
    }

    /// Schedule a relative move in the active unit. Does not block.
    ///
    /// The angle is rounded to the nearest whole step. Non-finite angles are
    /// ignored.
    pub fn rotate(&mut self, angle: f32) {
        if !angle.is_finite() {
            log::warn!("ignoring non-finite rotation {}", angle);
            return;
        }
        if !self.enabled {
            log::warn!("rotate({} {}) while driver is disabled", angle, self.unit.as_str());
        }
        let steps = libm::roundf(angle * self.steps_per(self.unit)) as i64;
        log::debug!(
            "rotate {} {} -> {} steps {}",
            angle,
            self.unit.as_str(),
            steps,
            Direction::from_steps(steps).as_str()
        );
        self.ramp.move_by(steps);
    }

    /// Take the next step if one is due.
    ///
    /// Returns true while a move is in progress, false once the target is
    /// reached or no move is pending.
    pub fn run(&mut self) -> Result<bool, P::Error> {
        if let Some(dir) = self.ramp.poll(self.clock.now_us()) {
            self.pins.set_direction(dir)?;
            self.pins.pulse_step()?;
        }
        Ok(self.ramp.is_running())
    }

    /// Run the current move to completion.
    ///
    /// Spins on [`run`](Self::run); nothing else gets control until the
    /// target is reached.
    pub fn blocking_run(&mut self) -> Result<(), P::Error> {
        while self.run()? {}
        Ok(())
    }

    /// True while moving or while a target has not been reached.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.ramp.is_running()
    }

    /// Decelerate to a halt at the configured acceleration.
    ///
    /// Keep calling [`run`](Self::run) until it returns false.
    pub fn stop(&mut self) {
        if self.ramp.is_running() {
            log::debug!("stop requested at step {}", self.ramp.position());
        }
        self.ramp.stop();
    }

    /// Drop the remaining move without deceleration steps.
    pub fn halt(&mut self) {
        self.ramp.halt();
    }

    /// Position in the active unit.
    pub fn position(&self) -> f32 {
        self.ramp.position() as f32 / self.steps_per(self.unit)
    }

    /// Position in steps.
    #[inline]
    pub fn position_steps(&self) -> i64 {
        self.ramp.position()
    }

    /// Remaining steps to the target (signed).
    #[inline]
    pub fn distance_to_go_steps(&self) -> i64 {
        self.ramp.distance_to_go()
    }

    /// Remaining angle to the target in the active unit.
    pub fn distance_to_go(&self) -> f32 {
        self.ramp.distance_to_go() as f32 / self.steps_per(self.unit)
    }

    /// Current speed in the active unit per second (signed).
    pub fn speed(&self) -> f32 {
        self.ramp.speed() / self.steps_per(self.unit)
    }

    /// Declare the current position to be zero, cancelling any move.
    pub fn set_current_position_zero(&mut self) {
        self.ramp.set_current_position(0);
    }

    /// The pins, for status reporting.
    #[inline]
    pub fn pins(&self) -> &P {
        &self.pins
    }
}
