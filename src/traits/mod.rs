//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that allow smart-window to:
//! - Drive different step/direction boards (ESP32 GPIO, desktop mock)
//! - Read end-stops wired with either polarity
//! - Schedule steps against any monotonic clock
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`StepperPins`]: Step pulse, direction and optional sleep/enable/reset lines
//! - [`LimitSensor`]: Normalized end-stop reading
//! - [`Clock`]: Microsecond time source for `no_std` environments

pub mod hardware;

pub use hardware::*;
