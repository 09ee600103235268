//! Edge case and boundary condition tests for the stepper stack

use smart_window::{
    hal::{FailingPins, MockClock, MockPins},
    AccelRamp, AngleUnit, CommandOutcome, ConfigError, ControlLine, LinearActuator, MotionProfile,
    RejectReason, StepperDriver, WindowConfig, WindowController, WindowState,
};

fn driver(clock: &MockClock) -> StepperDriver<MockPins, &MockClock> {
    StepperDriver::new(MockPins::new(), clock, MotionProfile::default()).unwrap()
}

// ============================================================================
// Boundary Value Tests
// ============================================================================

#[test]
fn zero_rotation_is_not_a_move() {
    let clock = MockClock::ticking(10);
    let mut d = driver(&clock);
    d.rotate(0.0);
    assert!(!d.is_running());
    assert!(!d.run().unwrap());
    assert_eq!(d.pins().pulses, 0);
}

#[test]
fn sub_step_rotation_rounds_to_nearest() {
    let clock = MockClock::new();
    let mut d = driver(&clock);
    // 1.8° per step at 200 steps/rev
    d.rotate(0.8);
    assert_eq!(d.distance_to_go_steps(), 0);
    d.rotate(1.0);
    assert_eq!(d.distance_to_go_steps(), 1);
}

#[test]
fn non_finite_rotation_ignored() {
    let clock = MockClock::new();
    let mut d = driver(&clock);
    d.rotate(f32::NAN);
    d.rotate(f32::INFINITY);
    assert_eq!(d.distance_to_go_steps(), 0);
}

#[test]
fn single_step_move() {
    let clock = MockClock::ticking(10);
    let mut d = driver(&clock);
    d.rotate(-1.8);
    d.blocking_run().unwrap();
    assert_eq!(d.pins().position, -1);
    assert_eq!(d.pins().pulses, 1);
    assert!(!d.is_running());
}

#[test]
fn rejects_degenerate_profile() {
    let clock = MockClock::new();
    for profile in [
        MotionProfile { max_speed: 0.0, ..MotionProfile::default() },
        MotionProfile { acceleration: f32::NAN, ..MotionProfile::default() },
        MotionProfile { steps_per_revolution: 0, ..MotionProfile::default() },
    ] {
        assert!(StepperDriver::new(MockPins::new(), &clock, profile).is_err());
    }
}

#[test]
fn rate_setters_keep_old_value_on_error() {
    let clock = MockClock::new();
    let mut d = driver(&clock);
    assert_eq!(d.set_max_speed(0.0), Err(ConfigError::InvalidMaxSpeed));
    assert_eq!(d.set_acceleration(f32::INFINITY), Err(ConfigError::InvalidAcceleration));
    assert!((d.max_speed() - 1080.0).abs() < 1e-2);
    assert!((d.acceleration() - 360.0).abs() < 1e-2);
}

#[test]
fn negative_acceleration_uses_magnitude() {
    let clock = MockClock::new();
    let mut d = driver(&clock);
    d.set_acceleration(-720.0).unwrap();
    assert!((d.acceleration() - 720.0).abs() < 1e-2);
}

#[test]
fn negative_radius_uses_magnitude() {
    let clock = MockClock::new();
    let mut actuator = LinearActuator::new(driver(&clock), -10.0).unwrap();
    assert_eq!(actuator.radius(), 10.0);
    actuator.move_by(31.4159);
    assert_eq!(actuator.driver().distance_to_go_steps(), 100);
}

#[test]
fn ramp_with_tiny_acceleration_still_finishes() {
    let mut ramp = AccelRamp::new(10.0, 0.5);
    ramp.move_to(3);
    let mut now = 0;
    while ramp.is_running() {
        ramp.poll(now);
        now += 10_000;
    }
    assert_eq!(ramp.position(), 3);
}

// ============================================================================
// Enable / Disable Edge Cases
// ============================================================================

#[test]
fn enable_twice_rewrites_lines() {
    let clock = MockClock::new();
    let mut d =
        StepperDriver::new(MockPins::fully_wired(), &clock, MotionProfile::default()).unwrap();
    d.enable().unwrap();
    d.enable().unwrap();
    assert_eq!(d.pins().writes_to(ControlLine::Sleep), 2);
    assert_eq!(d.pins().level(ControlLine::Sleep), Some(true));
    assert!(d.is_enabled());
}

#[test]
fn disable_when_never_enabled() {
    let clock = MockClock::new();
    let mut d =
        StepperDriver::new(MockPins::fully_wired(), &clock, MotionProfile::default()).unwrap();
    d.disable().unwrap();
    assert!(!d.is_enabled());
    assert_eq!(d.pins().level(ControlLine::Enable), Some(false));
    assert_eq!(d.pins().releases, 1);
}

#[test]
fn unwired_lines_untouched() {
    let clock = MockClock::new();
    let mut d = driver(&clock);
    d.enable().unwrap();
    d.disable().unwrap();
    for line in ControlLine::ALL {
        assert_eq!(d.pins().writes_to(line), 0);
    }
    assert!(d.pins().delays_ms.is_empty());
}

#[test]
fn pin_errors_propagate() {
    let clock = MockClock::ticking(10);
    let mut d = StepperDriver::new(FailingPins, &clock, MotionProfile::default()).unwrap();
    d.rotate(90.0);
    assert!(d.run().is_err());
}

// ============================================================================
// Window Edge Cases
// ============================================================================

#[test]
fn stop_while_idle_is_ignored() {
    let clock = MockClock::new();
    let mut w = WindowController::new(&WindowConfig::default(), MockPins::new(), &clock).unwrap();
    assert_eq!(w.stop(), CommandOutcome::Ignored(RejectReason::NotMoving));
    assert_eq!(w.state(), WindowState::Idle);
}

#[test]
fn config_with_bad_length_rejected() {
    let clock = MockClock::new();
    for length in [0.0, -1.0, f32::NAN] {
        let config = WindowConfig::default().with_length(length);
        assert!(matches!(
            WindowController::new(&config, MockPins::new(), &clock),
            Err(ConfigError::InvalidLength)
        ));
    }
}

#[test]
fn actuator_move_restores_unit() {
    let clock = MockClock::new();
    let mut d = driver(&clock);
    d.set_unit(AngleUnit::Degree);
    let mut actuator = LinearActuator::new(d, 5.0).unwrap();
    actuator.move_by(10.0);
    assert_eq!(actuator.driver().unit(), AngleUnit::Degree);
    // 2 rad
    assert!((actuator.driver().distance_to_go() - 114.6).abs() < 1.0);
}
