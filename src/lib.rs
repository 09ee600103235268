//! # smart-window
//!
//! Motion control for a stepper-driven window: trapezoidal speed profiles,
//! rotary-to-linear conversion and end-stop interlocks, with a non-blocking
//! polling loop that runs on an ESP32 or on a desktop with mock hardware.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for step/direction drivers, end-stop sensors and time
//! - **Non-blocking motion**: One step at most per `run()` call, accelerating and decelerating
//! - **Unit handling**: Angles in degrees or radians, linear moves in millimetres
//! - **End-stop interlock**: Requests into a triggered end-stop are ignored; contact mid-travel stops the motor
//! - **Single config record**: Validated up front, so bad geometry never reaches the motor
//!
//! ## Architecture
//!
//! Each layer owns the one below it:
//!
//! - `ramp` - Step timing for a trapezoidal profile (pure, time passed in)
//! - `stepper` - Stepper driver: pins, units, enable/disable
//! - `actuator` - Millimetres to radians through a pinion radius
//! - `window` - IDLE/OPENING/CLOSING state machine with end-stops
//! - `traits` - Hardware seams
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use smart_window::{WindowCommand, WindowConfig, WindowController, WindowState};
//! use smart_window::hal::{MockClock, MockPins};
//!
//! let clock = MockClock::ticking(20);
//! let config = WindowConfig::default().with_radius(10.0).with_length(50.0);
//! let mut window = WindowController::new(&config, MockPins::new(), &clock).unwrap();
//!
//! window.enable().unwrap();
//! window.apply(WindowCommand::Open);
//!
//! // Poll from your main loop
//! while window.run().unwrap() {}
//!
//! assert_eq!(window.state(), WindowState::Idle);
//! assert!((window.status().position_mm - 50.0).abs() < 0.1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Rotary-to-linear actuator on top of the stepper driver.
pub mod actuator;
/// Command vocabulary and outcomes for the window controller.
pub mod commands;
/// Window configuration record and validation.
pub mod config;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// End-stop switches with polarity normalization.
pub mod limit_switch;
/// Trapezoidal step scheduler.
pub mod ramp;
/// Non-blocking stepper driver with angle units.
pub mod stepper;
/// Core traits for hardware abstraction.
pub mod traits;
/// Window state machine with end-stop interlocks.
pub mod window;

// Re-exports for convenience
pub use actuator::{LinearActuator, LinearGeometry};
pub use commands::{CommandOutcome, RejectReason, WindowCommand};
pub use config::{ConfigError, DeviceConfig, PinAssignment, PinId, WindowConfig};
pub use limit_switch::{LimitSwitch, NoSensor, SensorType, TriggerPolarity};
pub use ramp::AccelRamp;
pub use stepper::{AngleUnit, MotionProfile, StepperDriver};
pub use traits::{Clock, ControlLine, Direction, LimitSensor, StepperPins};
pub use window::{WindowController, WindowState, WindowStatus};
