//! Window controller: the safety state machine on top of the actuator.
//!
//! [`WindowController`] owns a [`LinearActuator`] and up to two end-stop
//! sensors. It turns `open`/`close` into full-length linear moves and stops
//! the motor the moment the end-stop in the direction of travel triggers.
//!
//! # State Machine
//!
//! ```text
//!            open()                     close()
//!   ┌──────────────────┐       ┌──────────────────┐
//!   ▼                  │       │                  ▼
//! OPENING ──────────► IDLE ◄────────────────── CLOSING
//!   move done or open limit     move done or close limit
//! ```
//!
//! | Call | Effect |
//! |------|--------|
//! | `open()` / `close()` | Ignored if that end-stop is triggered; otherwise schedules ±length |
//! | `run()` in IDLE | Plain driver tick |
//! | `run()` while travelling | Limit triggered: halt, IDLE, one last tick. Otherwise tick; IDLE when done |
//! | `stop()` | Decelerate; IDLE once the motor is at rest |
//!
//! The end-stop interlock is active only when both sensors are present.
//! Without it `run()` is a plain driver tick, for bring-up on a bench.
//!
//! # Example
//!
//! ```rust
//! use smart_window::{LimitSwitch, TriggerPolarity, WindowConfig, WindowController, WindowState};
//! use smart_window::hal::{MockClock, MockInput, MockPins};
//!
//! let clock = MockClock::ticking(20);
//! let config = WindowConfig::default().with_length(20.0);
//!
//! let open_pin = MockInput::low();
//! let open_probe = open_pin.clone();
//! let close_pin = MockInput::low();
//!
//! let mut window = WindowController::new(&config, MockPins::new(), &clock)
//!     .unwrap()
//!     .with_sensors(
//!         LimitSwitch::new(open_pin, TriggerPolarity::ActiveHigh),
//!         LimitSwitch::new(close_pin, TriggerPolarity::ActiveHigh),
//!     );
//!
//! window.enable().unwrap();
//! window.open();
//! assert_eq!(window.state(), WindowState::Opening);
//!
//! // End-stop hit mid-travel
//! window.run().unwrap();
//! open_probe.set_high();
//! assert!(!window.run().unwrap());
//! assert_eq!(window.state(), WindowState::Idle);
//! ```

use crate::actuator::{check_length, LinearActuator, LinearGeometry};
use crate::commands::{CommandOutcome, RejectReason, WindowCommand};
use crate::config::{ConfigError, WindowConfig};
use crate::limit_switch::{NoSensor, SensorType};
use crate::stepper::StepperDriver;
use crate::traits::{Clock, LimitSensor, StepperPins};

// ============================================================================
// State
// ============================================================================

/// Motion state of the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WindowState {
    /// At rest.
    #[default]
    Idle,
    /// Travelling towards open.
    Opening,
    /// Travelling towards closed.
    Closing,
}

impl WindowState {
    /// Returns the state as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            WindowState::Idle => "idle",
            WindowState::Opening => "opening",
            WindowState::Closing => "closing",
        }
    }
}

/// Point-in-time view of the controller for a management layer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowStatus {
    /// Motion state
    pub state: WindowState,
    /// Position relative to power-on (mm)
    pub position_mm: f32,
    /// Travel left in the scheduled move (mm, signed)
    pub remaining_mm: f32,
    /// Motor still moving or target not reached
    pub running: bool,
    /// Driver awake
    pub enabled: bool,
    /// Both end-stops present
    pub interlock: bool,
    /// Open end-stop reading, if present
    pub open_limit: Option<bool>,
    /// Close end-stop reading, if present
    pub close_limit: Option<bool>,
    /// Full travel (mm)
    pub length_mm: f32,
    /// Open/close directions swapped
    pub inverted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Travel {
    Open,
    Close,
}

impl Travel {
    fn state(self) -> WindowState {
        match self {
            Travel::Open => WindowState::Opening,
            Travel::Close => WindowState::Closing,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Travel::Open => "open",
            Travel::Close => "close",
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Window with end-stop interlocks.
///
/// `S` is the end-stop sensor type; a `&mut LimitSwitch<_>` works when the
/// caller keeps ownership of the switches.
pub struct WindowController<P, C, S = NoSensor> {
    actuator: LinearActuator<P, C>,
    length_mm: f32,
    inverted: bool,
    state: WindowState,
    /// A user stop is decelerating the current move.
    stopping: bool,
    open_switch: Option<S>,
    close_switch: Option<S>,
}

impl<P: StepperPins, C: Clock> WindowController<P, C, NoSensor> {
    /// Build a controller from a configuration record.
    ///
    /// The record is validated first. The controller starts IDLE, without
    /// end-stops, with the driver disabled.
    pub fn new(config: &WindowConfig, pins: P, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let driver = StepperDriver::new(pins, clock, config.profile())?;
        let actuator = LinearActuator::new(driver, config.radius_mm)?;
        log::debug!(
            "window {}: length {} mm, radius {} mm, inverted {}",
            config.device.id.as_str(),
            config.length_mm,
            actuator.radius(),
            config.inverted
        );
        Ok(Self {
            actuator,
            length_mm: config.length_mm,
            inverted: config.inverted,
            state: WindowState::Idle,
            stopping: false,
            open_switch: None,
            close_switch: None,
        })
    }
}

impl<P: StepperPins, C: Clock, S: LimitSensor> WindowController<P, C, S> {
    /// Attach both end-stops, changing the sensor type.
    pub fn with_sensors<T: LimitSensor>(self, open: T, close: T) -> WindowController<P, C, T> {
        self.with_optional_sensors(Some(open), Some(close))
    }

    /// Attach whichever end-stops are present, changing the sensor type.
    pub fn with_optional_sensors<T: LimitSensor>(
        self,
        open: Option<T>,
        close: Option<T>,
    ) -> WindowController<P, C, T> {
        WindowController {
            actuator: self.actuator,
            length_mm: self.length_mm,
            inverted: self.inverted,
            state: self.state,
            stopping: self.stopping,
            open_switch: open,
            close_switch: close,
        }
    }

    /// Replace the end-stops. `None` removes one.
    pub fn set_sensors(&mut self, open: Option<S>, close: Option<S>) {
        self.open_switch = open;
        self.close_switch = close;
        log::debug!("sensors set, interlock {}", self.has_interlock());
    }

    /// Remove and return both end-stops.
    pub fn clear_sensors(&mut self) -> (Option<S>, Option<S>) {
        (self.open_switch.take(), self.close_switch.take())
    }

    /// Kind of end-stop attached, if any.
    pub fn sensor_type(&self) -> Option<SensorType> {
        if self.open_switch.is_some() || self.close_switch.is_some() {
            Some(SensorType::LimitSwitch)
        } else {
            None
        }
    }

    /// True when both end-stops are present and `run()` enforces them.
    pub fn has_interlock(&self) -> bool {
        self.open_switch.is_some() && self.close_switch.is_some()
    }

    /// Re-apply a configuration record.
    ///
    /// Validated first; on error nothing changes. Pin numbers and limit
    /// polarity are wiring and are not re-applied.
    pub fn set_config(&mut self, config: &WindowConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.actuator.driver_mut().set_profile(config.profile())?;
        self.actuator.set_radius(config.radius_mm)?;
        self.length_mm = config.length_mm;
        self.inverted = config.inverted;
        log::info!(
            "config applied: length {} mm, radius {} mm, inverted {}",
            self.length_mm,
            self.actuator.radius(),
            self.inverted
        );
        Ok(())
    }

    /// Full travel length in millimetres.
    #[inline]
    pub fn length(&self) -> f32 {
        self.length_mm
    }

    /// Set the travel length. Zero, negative and non-finite are rejected.
    pub fn set_length(&mut self, length_mm: f32) -> Result<(), ConfigError> {
        self.length_mm = check_length(length_mm)?;
        Ok(())
    }

    /// Set the pinion radius (mm). Zero is rejected.
    pub fn set_radius(&mut self, radius_mm: f32) -> Result<(), ConfigError> {
        self.actuator.set_radius(radius_mm)
    }

    /// True when open and close directions are swapped.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Swap the open and close directions.
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    /// Radius, length and inversion.
    pub fn geometry(&self) -> LinearGeometry {
        LinearGeometry {
            radius_mm: self.actuator.radius(),
            length_mm: self.length_mm,
            inverted: self.inverted,
        }
    }

    /// Current motion state.
    #[inline]
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// The actuator, for read-only inspection.
    #[inline]
    pub fn actuator(&self) -> &LinearActuator<P, C> {
        &self.actuator
    }

    /// Wake the driver.
    pub fn enable(&mut self) -> Result<(), P::Error> {
        self.actuator.enable()
    }

    /// Put the driver to sleep.
    pub fn disable(&mut self) -> Result<(), P::Error> {
        self.actuator.disable()
    }

    /// Start travelling towards open.
    ///
    /// Ignored while the open end-stop is triggered or while already opening.
    pub fn open(&mut self) -> CommandOutcome {
        self.request(Travel::Open)
    }

    /// Start travelling towards closed.
    ///
    /// Ignored while the close end-stop is triggered or while already closing.
    pub fn close(&mut self) -> CommandOutcome {
        self.request(Travel::Close)
    }

    /// Decelerate to a halt. The state returns to IDLE once `run()`
    /// reports the motor at rest.
    pub fn stop(&mut self) -> CommandOutcome {
        if !self.actuator.is_running() {
            return CommandOutcome::Ignored(RejectReason::NotMoving);
        }
        log::debug!("stop requested while {}", self.state.as_str());
        self.actuator.stop();
        self.stopping = true;
        CommandOutcome::Stopping
    }

    /// Dispatch a command.
    pub fn apply(&mut self, command: WindowCommand) -> CommandOutcome {
        match command {
            WindowCommand::Open => self.open(),
            WindowCommand::Close => self.close(),
            WindowCommand::Stop => self.stop(),
        }
    }

    fn request(&mut self, travel: Travel) -> CommandOutcome {
        let switch = match travel {
            Travel::Open => self.open_switch.as_mut(),
            Travel::Close => self.close_switch.as_mut(),
        };
        if switch.map_or(false, |s| s.is_triggered()) {
            log::warn!("{} ignored: end-stop triggered", travel.as_str());
            return CommandOutcome::Ignored(RejectReason::LimitReached);
        }

        let target = travel.state();
        if self.state == target && self.actuator.is_running() && !self.stopping {
            log::debug!("{} ignored: already {}", travel.as_str(), target.as_str());
            return CommandOutcome::Ignored(RejectReason::AlreadyMoving);
        }
        if self.state != WindowState::Idle && self.state != target {
            log::debug!("reversing: {} -> {}", self.state.as_str(), target.as_str());
        }

        let distance = self.signed_distance(travel);
        self.actuator.move_by(distance);
        self.state = target;
        self.stopping = false;
        log::debug!("{} started: {} mm", travel.as_str(), distance);
        CommandOutcome::Started
    }

    fn signed_distance(&self, travel: Travel) -> f32 {
        let towards_open = if self.inverted { -self.length_mm } else { self.length_mm };
        match travel {
            Travel::Open => towards_open,
            Travel::Close => -towards_open,
        }
    }

    /// Advance motion by at most one step, enforcing the end-stops.
    ///
    /// Must be polled continuously. Returns true while a move is in
    /// progress.
    pub fn run(&mut self) -> Result<bool, P::Error> {
        if !self.has_interlock() {
            let running = self.actuator.run()?;
            if !running {
                self.settle();
            }
            return Ok(running);
        }

        let switch = match self.state {
            WindowState::Idle => return self.actuator.run(),
            WindowState::Opening => self.open_switch.as_mut(),
            WindowState::Closing => self.close_switch.as_mut(),
        };

        if switch.map_or(false, |s| s.is_triggered()) {
            log::info!(
                "{} end-stop reached at {:.1} mm, stopping",
                self.state.as_str(),
                self.actuator.position_mm()
            );
            self.actuator.halt();
            self.state = WindowState::Idle;
            self.stopping = false;
            return self.actuator.run();
        }

        let running = self.actuator.run()?;
        if !running {
            self.settle();
        }
        Ok(running)
    }

    fn settle(&mut self) {
        self.stopping = false;
        if self.state != WindowState::Idle {
            log::debug!("{} complete at {:.1} mm", self.state.as_str(), self.actuator.position_mm());
            self.state = WindowState::Idle;
        }
    }

    /// Snapshot for status reporting. Reads the end-stops.
    pub fn status(&mut self) -> WindowStatus {
        let interlock = self.has_interlock();
        WindowStatus {
            state: self.state,
            position_mm: self.actuator.position_mm(),
            remaining_mm: self.actuator.remaining_mm(),
            running: self.actuator.is_running(),
            enabled: self.actuator.driver().is_enabled(),
            interlock,
            open_limit: self.open_switch.as_mut().map(|s| s.is_triggered()),
            close_limit: self.close_switch.as_mut().map(|s| s.is_triggered()),
            length_mm: self.length_mm,
            inverted: self.inverted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockClock, MockPins};

    struct Flag(bool);

    impl LimitSensor for Flag {
        fn is_triggered(&mut self) -> bool {
            self.0
        }
    }

    fn fast_config() -> WindowConfig {
        WindowConfig::default()
            .with_radius(10.0)
            .with_length(100.0)
            .with_max_speed(7200.0)
            .with_acceleration(36_000.0)
    }

    fn window(clock: &MockClock) -> WindowController<MockPins, &MockClock> {
        WindowController::new(&fast_config(), MockPins::new(), clock).unwrap()
    }

    fn run_until_idle<P: StepperPins, C: Clock, S: LimitSensor>(w: &mut WindowController<P, C, S>)
    where
        P::Error: core::fmt::Debug,
    {
        let mut guard = 0u32;
        while w.run().unwrap() {
            guard += 1;
            assert!(guard < 2_000_000, "window never settled");
        }
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[test]
    fn new_starts_idle_without_interlock() {
        let clock = MockClock::new();
        let w = window(&clock);
        assert_eq!(w.state(), WindowState::Idle);
        assert!(!w.has_interlock());
        assert_eq!(w.sensor_type(), None);
        assert_eq!(w.length(), 100.0);
        assert!(!w.is_inverted());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let clock = MockClock::new();
        let config = WindowConfig::default().with_radius(0.0);
        assert!(matches!(
            WindowController::new(&config, MockPins::new(), &clock),
            Err(ConfigError::ZeroRadius)
        ));
    }

    #[test]
    fn sensor_type_with_one_switch() {
        let clock = MockClock::new();
        let mut w = window(&clock).with_sensors(Flag(false), Flag(false));
        assert!(w.has_interlock());
        let (open, _close) = w.clear_sensors();
        assert!(open.is_some());
        assert_eq!(w.sensor_type(), None);

        w.set_sensors(Some(Flag(false)), None);
        assert_eq!(w.sensor_type(), Some(SensorType::LimitSwitch));
        assert!(!w.has_interlock());
    }

    // =========================================================================
    // Open / Close Tests
    // =========================================================================

    #[test]
    fn open_schedules_positive_length() {
        let clock = MockClock::new();
        let mut w = window(&clock);
        assert_eq!(w.open(), CommandOutcome::Started);
        assert_eq!(w.state(), WindowState::Opening);
        // 100 mm / 10 mm = 10 rad = 318.3 steps
        assert_eq!(w.actuator().driver().distance_to_go_steps(), 318);
    }

    #[test]
    fn inverted_open_goes_negative() {
        let clock = MockClock::new();
        let mut w = window(&clock);
        w.set_inverted(true);
        w.open();
        assert_eq!(w.actuator().driver().distance_to_go_steps(), -318);
    }

    #[test]
    fn open_blocked_by_triggered_switch() {
        let clock = MockClock::new();
        let mut w = window(&clock).with_sensors(Flag(true), Flag(false));
        assert_eq!(w.open(), CommandOutcome::Ignored(RejectReason::LimitReached));
        assert_eq!(w.state(), WindowState::Idle);
        assert!(!w.actuator().is_running());

        // Close is still allowed
        assert_eq!(w.close(), CommandOutcome::Started);
        assert_eq!(w.state(), WindowState::Closing);
    }

    #[test]
    fn same_direction_request_merged() {
        let clock = MockClock::ticking(10);
        let mut w = window(&clock);
        w.open();
        for _ in 0..50 {
            w.run().unwrap();
        }
        let target = w.actuator().driver().distance_to_go_steps() + w.actuator().driver().position_steps();
        assert_eq!(w.open(), CommandOutcome::Ignored(RejectReason::AlreadyMoving));
        let after = w.actuator().driver().distance_to_go_steps() + w.actuator().driver().position_steps();
        assert_eq!(target, after);
    }

    #[test]
    fn reversal_returns_to_start() {
        let clock = MockClock::ticking(10);
        let mut w = window(&clock);
        w.enable().unwrap();
        w.open();
        while w.actuator().driver().position_steps() < 100 {
            w.run().unwrap();
        }
        let reversed_at = w.actuator().driver().position_steps();
        assert_eq!(w.close(), CommandOutcome::Started);
        assert_eq!(w.state(), WindowState::Closing);
        run_until_idle(&mut w);

        assert_eq!(w.state(), WindowState::Idle);
        assert_eq!(w.actuator().driver().position_steps(), reversed_at - 318);
    }

    // =========================================================================
    // Run Tests
    // =========================================================================

    #[test]
    fn open_runs_to_idle() {
        let clock = MockClock::ticking(10);
        let mut w = window(&clock).with_sensors(Flag(false), Flag(false));
        w.enable().unwrap();
        w.open();
        run_until_idle(&mut w);
        assert_eq!(w.state(), WindowState::Idle);
        assert_eq!(w.actuator().driver().pins().position, 318);
    }

    #[test]
    fn idle_run_is_plain_tick() {
        let clock = MockClock::ticking(10);
        let mut w = window(&clock).with_sensors(Flag(true), Flag(true));
        assert!(!w.run().unwrap());
        assert_eq!(w.state(), WindowState::Idle);
    }

    #[test]
    fn limit_contact_halts_immediately() {
        let clock = MockClock::ticking(10);
        let mut w = window(&clock).with_sensors(Flag(false), Flag(false));
        w.open();
        while w.actuator().driver().position_steps() < 50 {
            w.run().unwrap();
        }
        if let Some(open) = w.open_switch.as_mut() {
            open.0 = true;
        }
        let pulses = w.actuator().driver().pins().pulses;

        assert!(!w.run().unwrap());
        assert_eq!(w.state(), WindowState::Idle);
        assert!(!w.run().unwrap());
        assert_eq!(w.actuator().driver().pins().pulses, pulses);
    }

    #[test]
    fn stop_settles_to_idle() {
        let clock = MockClock::ticking(10);
        let mut w = window(&clock);
        assert_eq!(w.stop(), CommandOutcome::Ignored(RejectReason::NotMoving));

        w.open();
        for _ in 0..2_000 {
            w.run().unwrap();
        }
        assert_eq!(w.stop(), CommandOutcome::Stopping);
        assert_eq!(w.state(), WindowState::Opening);
        run_until_idle(&mut w);
        assert_eq!(w.state(), WindowState::Idle);
        assert!(w.actuator().driver().position_steps() < 318);
    }

    #[test]
    fn reopen_while_stopping_restarts() {
        let clock = MockClock::ticking(10);
        let mut w = window(&clock);
        w.open();
        for _ in 0..2_000 {
            w.run().unwrap();
        }
        assert_eq!(w.stop(), CommandOutcome::Stopping);
        assert!(w.actuator().is_running());

        let from = w.actuator().driver().position_steps();
        assert_eq!(w.open(), CommandOutcome::Started);
        assert_eq!(w.state(), WindowState::Opening);
        // Merged again once the new move is under way
        assert_eq!(w.open(), CommandOutcome::Ignored(RejectReason::AlreadyMoving));

        run_until_idle(&mut w);
        assert_eq!(w.actuator().driver().position_steps(), from + 318);
    }

    #[test]
    fn apply_dispatches() {
        let clock = MockClock::new();
        let mut w = window(&clock);
        assert_eq!(w.apply(WindowCommand::Close), CommandOutcome::Started);
        assert_eq!(w.state(), WindowState::Closing);
        assert_eq!(w.apply(WindowCommand::Stop), CommandOutcome::Stopping);
    }

    // =========================================================================
    // Config Tests
    // =========================================================================

    #[test]
    fn set_config_is_atomic() {
        let clock = MockClock::new();
        let mut w = window(&clock);
        let bad = fast_config().with_length(250.0).with_radius(0.0);
        assert_eq!(w.set_config(&bad), Err(ConfigError::ZeroRadius));
        assert_eq!(w.length(), 100.0);

        let good = fast_config().with_length(250.0).with_inverted(true);
        w.set_config(&good).unwrap();
        assert_eq!(w.length(), 250.0);
        assert!(w.is_inverted());
    }

    #[test]
    fn set_length_rejects_zero() {
        let clock = MockClock::new();
        let mut w = window(&clock);
        assert_eq!(w.set_length(0.0), Err(ConfigError::InvalidLength));
        assert_eq!(w.set_length(-3.0), Err(ConfigError::InvalidLength));
        w.set_length(42.0).unwrap();
        assert_eq!(w.length(), 42.0);
    }

    #[test]
    fn status_snapshot() {
        let clock = MockClock::new();
        let mut w = window(&clock).with_sensors(Flag(true), Flag(false));
        w.enable().unwrap();
        let status = w.status();
        assert_eq!(status.state, WindowState::Idle);
        assert!(status.enabled);
        assert!(status.interlock);
        assert_eq!(status.open_limit, Some(true));
        assert_eq!(status.close_limit, Some(false));
        assert_eq!(status.length_mm, 100.0);
        assert!(!status.running);
    }
}
