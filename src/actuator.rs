//! Rotary-to-linear conversion on top of [`StepperDriver`].
//!
//! A pinion (or pulley) of radius `r` moves the load `r` millimetres per
//! radian:
//!
//! ```text
//! angle_rad = distance_mm / radius_mm
//! ```
//!
//! [`LinearActuator`] owns the driver. Linear moves are scheduled in
//! radians and the driver's active unit is restored afterwards, so callers
//! working in degrees are not surprised.
//!
//! # Example
//!
//! ```rust
//! use smart_window::{AngleUnit, LinearActuator, MotionProfile, StepperDriver};
//! use smart_window::hal::{MockClock, MockPins};
//!
//! let clock = MockClock::new();
//! let driver = StepperDriver::new(MockPins::new(), &clock, MotionProfile::default()).unwrap();
//! let mut actuator = LinearActuator::new(driver, 10.0).unwrap();
//!
//! actuator.move_by(31.4159);           // half a turn
//! assert_eq!(actuator.driver().distance_to_go_steps(), 100);
//! assert_eq!(actuator.driver().unit(), AngleUnit::Degree);
//! ```

use crate::config::ConfigError;
use crate::stepper::{AngleUnit, StepperDriver};
use crate::traits::{Clock, StepperPins};

/// Radius, travel and direction of a linear axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearGeometry {
    /// Pinion radius (mm); the sign is ignored
    pub radius_mm: f32,
    /// Full travel (mm)
    pub length_mm: f32,
    /// Swap the open and close directions
    pub inverted: bool,
}

impl LinearGeometry {
    /// Check radius and travel length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_radius(self.radius_mm)?;
        check_length(self.length_mm)?;
        Ok(())
    }
}

pub(crate) fn check_radius(radius_mm: f32) -> Result<f32, ConfigError> {
    let radius = libm::fabsf(radius_mm);
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(ConfigError::ZeroRadius)
    }
}

pub(crate) fn check_length(length_mm: f32) -> Result<f32, ConfigError> {
    if length_mm.is_finite() && length_mm > 0.0 {
        Ok(length_mm)
    } else {
        Err(ConfigError::InvalidLength)
    }
}

/// Stepper driving a linear axis through a pinion.
pub struct LinearActuator<P, C> {
    driver: StepperDriver<P, C>,
    radius_mm: f32,
}

impl<P: StepperPins, C: Clock> LinearActuator<P, C> {
    /// Wrap a driver. Zero or non-finite radius is rejected.
    pub fn new(driver: StepperDriver<P, C>, radius_mm: f32) -> Result<Self, ConfigError> {
        let radius_mm = check_radius(radius_mm)?;
        Ok(Self { driver, radius_mm })
    }

    /// Set the radius (mm). Stored as its magnitude; zero is rejected.
    pub fn set_radius(&mut self, radius_mm: f32) -> Result<(), ConfigError> {
        self.radius_mm = check_radius(radius_mm)?;
        Ok(())
    }

    /// Radius in millimetres.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius_mm
    }

    /// Shaft angle (radians) that moves the load `distance_mm`.
    #[inline]
    pub fn distance_to_angle(&self, distance_mm: f32) -> f32 {
        distance_mm / self.radius_mm
    }

    /// Load travel (mm) for a shaft angle in radians.
    #[inline]
    pub fn angle_to_distance(&self, angle_rad: f32) -> f32 {
        angle_rad * self.radius_mm
    }

    /// Schedule a relative linear move. Does not block.
    pub fn move_by(&mut self, distance_mm: f32) {
        let angle = self.distance_to_angle(distance_mm);
        log::debug!("move {} mm ({} rad)", distance_mm, angle);
        self.with_unit(AngleUnit::Radian, |driver| driver.rotate(angle));
    }

    /// Run `f` with the driver switched to `unit`, then restore the previous unit.
    fn with_unit<R>(&mut self, unit: AngleUnit, f: impl FnOnce(&mut StepperDriver<P, C>) -> R) -> R {
        let previous = self.driver.unit();
        self.driver.set_unit(unit);
        let out = f(&mut self.driver);
        self.driver.set_unit(previous);
        out
    }

    /// Load position (mm) relative to where the driver was zeroed.
    pub fn position_mm(&self) -> f32 {
        let steps = self.driver.position_steps() as f32;
        self.angle_to_distance(steps / self.driver.steps_per(AngleUnit::Radian))
    }

    /// Remaining travel (mm) of the scheduled move, signed.
    pub fn remaining_mm(&self) -> f32 {
        let steps = self.driver.distance_to_go_steps() as f32;
        self.angle_to_distance(steps / self.driver.steps_per(AngleUnit::Radian))
    }

    /// See [`StepperDriver::run`].
    #[inline]
    pub fn run(&mut self) -> Result<bool, P::Error> {
        self.driver.run()
    }

    /// See [`StepperDriver::is_running`].
    #[inline]
    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    /// See [`StepperDriver::stop`].
    #[inline]
    pub fn stop(&mut self) {
        self.driver.stop();
    }

    /// See [`StepperDriver::halt`].
    #[inline]
    pub fn halt(&mut self) {
        self.driver.halt();
    }

    /// See [`StepperDriver::enable`].
    #[inline]
    pub fn enable(&mut self) -> Result<(), P::Error> {
        self.driver.enable()
    }

    /// See [`StepperDriver::disable`].
    #[inline]
    pub fn disable(&mut self) -> Result<(), P::Error> {
        self.driver.disable()
    }

    /// The underlying driver.
    #[inline]
    pub fn driver(&self) -> &StepperDriver<P, C> {
        &self.driver
    }

    /// Mutable access to the underlying driver.
    #[inline]
    pub fn driver_mut(&mut self) -> &mut StepperDriver<P, C> {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockClock, MockPins};
    use crate::stepper::MotionProfile;

    fn actuator(clock: &MockClock, radius: f32) -> LinearActuator<MockPins, &MockClock> {
        let driver = StepperDriver::new(MockPins::new(), clock, MotionProfile::default()).unwrap();
        LinearActuator::new(driver, radius).unwrap()
    }

    #[test]
    fn zero_radius_rejected() {
        let clock = MockClock::new();
        let driver = StepperDriver::new(MockPins::new(), &clock, MotionProfile::default()).unwrap();
        assert!(matches!(LinearActuator::new(driver, 0.0), Err(ConfigError::ZeroRadius)));
    }

    #[test]
    fn set_radius_zero_keeps_previous() {
        let clock = MockClock::new();
        let mut a = actuator(&clock, 10.0);
        assert_eq!(a.set_radius(0.0), Err(ConfigError::ZeroRadius));
        assert_eq!(a.set_radius(f32::NAN), Err(ConfigError::ZeroRadius));
        assert_eq!(a.radius(), 10.0);
    }

    #[test]
    fn radius_stored_as_magnitude() {
        let clock = MockClock::new();
        let mut a = actuator(&clock, -4.0);
        assert_eq!(a.radius(), 4.0);
        a.set_radius(-12.5).unwrap();
        assert_eq!(a.radius(), 12.5);
    }

    #[test]
    fn conversion_round_trip() {
        let clock = MockClock::new();
        let a = actuator(&clock, 6.359_439_4);
        for d in [0.0f32, 1.0, -25.0, 500.0] {
            let back = a.angle_to_distance(a.distance_to_angle(d));
            assert!((back - d).abs() < 1e-3);
        }
    }

    #[test]
    fn move_schedules_radian_equivalent() {
        let clock = MockClock::new();
        let mut a = actuator(&clock, 10.0);
        a.move_by(500.0);
        // 50 rad * 200 / 2π = 1591.5 -> 1592
        assert_eq!(a.driver().distance_to_go_steps(), 1592);
        assert!((a.remaining_mm() - 500.0).abs() < 0.5);
    }

    #[test]
    fn move_restores_degree_unit() {
        let clock = MockClock::new();
        let mut a = actuator(&clock, 10.0);
        a.move_by(10.0);
        assert_eq!(a.driver().unit(), AngleUnit::Degree);
    }

    #[test]
    fn move_keeps_radian_unit() {
        let clock = MockClock::new();
        let mut a = actuator(&clock, 10.0);
        a.driver_mut().set_unit(AngleUnit::Radian);
        a.move_by(-10.0);
        assert_eq!(a.driver().unit(), AngleUnit::Radian);
        assert_eq!(a.driver().distance_to_go_steps(), -32);
    }

    #[test]
    fn position_tracks_travel() {
        let clock = MockClock::ticking(20);
        let mut a = actuator(&clock, 10.0);
        a.enable().unwrap();
        a.move_by(31.415_926);
        while a.run().unwrap() {}
        assert_eq!(a.driver().position_steps(), 100);
        assert!((a.position_mm() - 31.415_926).abs() < 0.01);
        assert_eq!(a.remaining_mm(), 0.0);
    }

    #[test]
    fn geometry_validation() {
        let ok = LinearGeometry { radius_mm: 10.0, length_mm: 500.0, inverted: false };
        assert!(ok.validate().is_ok());

        let no_radius = LinearGeometry { radius_mm: 0.0, ..ok };
        assert_eq!(no_radius.validate(), Err(ConfigError::ZeroRadius));

        let no_length = LinearGeometry { length_mm: 0.0, ..ok };
        assert_eq!(no_length.validate(), Err(ConfigError::InvalidLength));
    }
}
