//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `step_dir`: [`StepperPins`](crate::traits::StepperPins) over any `embedded-hal` output pins
//! - `esp32`: ESP-IDF GPIO, timer and end-stop inputs (requires `esp32` feature)

pub mod mock;
pub mod step_dir;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;
pub use step_dir::{NoDelay, NoPin, StepDirPins};

#[cfg(feature = "esp32")]
pub use esp32::*;
