//! Trapezoidal step scheduler.
//!
//! [`AccelRamp`] decides *when* the next step is due. It is pure: time is
//! passed in, no pins are touched, so the same ramp drives real hardware
//! and host tests.
//!
//! # Algorithm
//!
//! Step intervals follow the recurrence from D. Austin, "Generate stepper-motor
//! speed profiles in real time" (2005):
//!
//! ```text
//! c0 = 0.676 * sqrt(2 / a) * 1e6          first interval (us)
//! cn = cn-1 - 2 * cn-1 / (4 * n + 1)      accelerate while n > 0
//! cn >= cmin = 1e6 / max_speed            cruise
//! ```
//!
//! `n` is set negative once the remaining distance is no more than the
//! stopping distance `v^2 / 2a`, which makes the same recurrence decelerate
//! so that the last step lands on the target.
//!
//! # Example
//!
//! ```rust
//! use smart_window::ramp::AccelRamp;
//!
//! let mut ramp = AccelRamp::new(1000.0, 2000.0);
//! ramp.move_to(50);
//!
//! let mut now_us = 0;
//! while ramp.is_running() {
//!     ramp.poll(now_us);
//!     now_us += 50;
//! }
//! assert_eq!(ramp.position(), 50);
//! ```

use crate::traits::Direction;

/// Scales the first interval to correct the error of the recurrence at n = 1.
const FIRST_STEP_FACTOR: f32 = 0.676;

const MICROS_PER_SEC: f32 = 1_000_000.0;

/// Step scheduler implementing a trapezoidal speed profile.
///
/// Positions are absolute step counts. Speeds are in steps/s, acceleration
/// in steps/s². Both are stored as magnitudes.
#[derive(Debug, Clone)]
pub struct AccelRamp {
    position: i64,
    target: i64,
    /// Signed speed of the last scheduled step (steps/s).
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    /// Interval until the next step; 0 when no step is scheduled.
    step_interval_us: u64,
    /// Time of the last step; `None` until the first step of a move.
    last_step_us: Option<u64>,
    /// Step index within the current ramp; negative while decelerating.
    n: i64,
    c0: f32,
    cn: f32,
    cmin: f32,
    direction: Direction,
}

impl AccelRamp {
    /// Create a ramp at position 0 with no pending move.
    ///
    /// Non-positive or non-finite values leave the corresponding limit at
    /// 1 step/s (speed) or 1 step/s² (acceleration).
    pub fn new(max_speed: f32, acceleration: f32) -> Self {
        let mut ramp = Self {
            position: 0,
            target: 0,
            speed: 0.0,
            max_speed: 0.0,
            acceleration: 0.0,
            step_interval_us: 0,
            last_step_us: None,
            n: 0,
            c0: 0.0,
            cn: 0.0,
            cmin: MICROS_PER_SEC,
            direction: Direction::Clockwise,
        };
        ramp.set_max_speed(1.0);
        ramp.set_acceleration(1.0);
        ramp.set_max_speed(max_speed);
        ramp.set_acceleration(acceleration);
        ramp
    }

    /// Set the cruise speed limit in steps/s.
    ///
    /// The sign is ignored. Zero and non-finite values are ignored.
    pub fn set_max_speed(&mut self, steps_per_sec: f32) {
        let speed = libm::fabsf(steps_per_sec);
        if !speed.is_finite() || speed == 0.0 || speed == self.max_speed {
            return;
        }
        self.max_speed = speed;
        self.cmin = MICROS_PER_SEC / speed;
        // Already ramping: recompute where on the ramp the new limit puts us
        if self.n > 0 {
            self.n = self.steps_to_stop();
            self.compute_new_speed();
        }
    }

    /// Set the acceleration in steps/s².
    ///
    /// The sign is ignored. Zero and non-finite values are ignored.
    pub fn set_acceleration(&mut self, steps_per_sec2: f32) {
        let accel = libm::fabsf(steps_per_sec2);
        if !accel.is_finite() || accel == 0.0 || accel == self.acceleration {
            return;
        }
        if self.acceleration > 0.0 {
            // Keep the current speed: n scales inversely with acceleration
            self.n = (self.n as f32 * (self.acceleration / accel)) as i64;
        }
        self.c0 = FIRST_STEP_FACTOR * libm::sqrtf(2.0 / accel) * MICROS_PER_SEC;
        self.acceleration = accel;
        self.compute_new_speed();
    }

    /// Cruise speed limit in steps/s.
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Acceleration in steps/s².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Set an absolute target position.
    pub fn move_to(&mut self, target: i64) {
        if self.target != target {
            self.target = target;
            self.compute_new_speed();
        }
    }

    /// Set a target relative to the current position.
    pub fn move_by(&mut self, steps: i64) {
        self.move_to(self.position.saturating_add(steps));
    }

    /// Retarget to the closest position the motor can stop at under the
    /// configured deceleration.
    ///
    /// Does nothing when already at rest.
    pub fn stop(&mut self) {
        if self.speed != 0.0 {
            let steps = self.steps_to_stop() + 1;
            if self.speed > 0.0 {
                self.move_by(steps);
            } else {
                self.move_by(-steps);
            }
        }
    }

    /// Abandon the remaining move without further steps.
    ///
    /// The position is kept; the target collapses onto it.
    pub fn halt(&mut self) {
        self.target = self.position;
        self.speed = 0.0;
        self.n = 0;
        self.step_interval_us = 0;
        self.last_step_us = None;
    }

    /// Redefine the current position, cancelling any move.
    pub fn set_current_position(&mut self, position: i64) {
        self.position = position;
        self.halt();
    }

    /// Advance the schedule to `now_us`.
    ///
    /// Returns the direction of the step taken, if one was due. At most one
    /// step is taken per call.
    pub fn poll(&mut self, now_us: u64) -> Option<Direction> {
        if self.step_interval_us == 0 {
            return None;
        }
        if let Some(last) = self.last_step_us {
            if now_us.wrapping_sub(last) < self.step_interval_us {
                return None;
            }
        }

        let dir = self.direction;
        self.position += dir.sign();
        self.last_step_us = Some(now_us);
        self.compute_new_speed();
        Some(dir)
    }

    /// Current absolute position in steps.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Target absolute position in steps.
    #[inline]
    pub fn target(&self) -> i64 {
        self.target
    }

    /// Signed number of steps left to the target.
    #[inline]
    pub fn distance_to_go(&self) -> i64 {
        self.target - self.position
    }

    /// Signed speed of the most recent step in steps/s.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Interval until the next step in microseconds (0 = none scheduled).
    #[inline]
    pub fn step_interval_us(&self) -> u64 {
        self.step_interval_us
    }

    /// True while moving or while a target has not been reached.
    #[inline]
    pub fn is_running(&self) -> bool {
        !(self.speed == 0.0 && self.target == self.position)
    }

    fn steps_to_stop(&self) -> i64 {
        ((self.speed * self.speed) / (2.0 * self.acceleration)) as i64
    }

    fn compute_new_speed(&mut self) {
        let distance_to = self.distance_to_go();
        let steps_to_stop = self.steps_to_stop();

        if distance_to == 0 && steps_to_stop <= 1 {
            // At the target and slow enough to stop here
            self.step_interval_us = 0;
            self.speed = 0.0;
            self.n = 0;
            self.last_step_us = None;
            return;
        }

        if distance_to > 0 {
            if self.n > 0 {
                // Out of room, or heading the wrong way: start decelerating
                if steps_to_stop >= distance_to || self.direction == Direction::CounterClockwise {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < distance_to && self.direction == Direction::Clockwise {
                self.n = -self.n;
            }
        } else if distance_to < 0 {
            if self.n > 0 {
                if steps_to_stop >= -distance_to || self.direction == Direction::Clockwise {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < -distance_to
                && self.direction == Direction::CounterClockwise
            {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            self.cn = self.c0;
            self.direction = Direction::from_steps(distance_to);
        } else {
            self.cn -= (2.0 * self.cn) / ((4.0 * self.n as f32) + 1.0);
            self.cn = self.cn.max(self.cmin);
        }
        self.n += 1;

        self.step_interval_us = (self.cn as u64).max(1);
        self.speed = MICROS_PER_SEC / self.cn;
        if self.direction == Direction::CounterClockwise {
            self.speed = -self.speed;
        }
    }
}
