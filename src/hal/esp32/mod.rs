//! ESP32 hardware abstraction layer for the window actuator.
//!
//! This module provides hardware implementations for an ESP32 board driving
//! a window through an A4988/DRV8825 step/direction driver.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (Xtensa or RISC-V, ESP-IDF)
//! - **Motor Driver**: A4988 / DRV8825 carrier (STEP, DIR, SLEEP)
//! - **End-stops**: two switches to ground, internal pull-ups
//!
//! # Pin Assignments
//!
//! Defaults are DIR GPIO4, STEP GPIO5 and SLEEP GPIO16, as in
//! [`PinAssignment::default`](crate::PinAssignment::default). A
//! [`WindowConfig`](crate::WindowConfig) can override every one of them.

mod clock;
mod gpio;

pub use clock::Esp32Clock;
pub use gpio::{limit_switch, stepper_pins, Esp32LimitSwitch, Esp32Output, Esp32StepperPins};
