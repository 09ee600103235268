//! Window configuration record shared by desktop and ESP32 builds.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! [`WindowConfig`] is the single record a persistence layer stores and
//! hands back: pin numbers, geometry and motion profile. It is validated
//! once, at construction (or `set_config`) time, so degenerate geometry
//! never reaches the motion code.
//!
//! # Example
//!
//! ```rust
//! use smart_window::config::{ConfigError, PinAssignment, PinId, WindowConfig};
//!
//! // Use defaults (the shipped board)
//! let config = WindowConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = WindowConfig::default()
//!     .with_radius(10.0)
//!     .with_length(500.0)
//!     .with_pins(PinAssignment::default().with_sleep(PinId::UNSET));
//! assert_eq!(config.pins.sleep.get(), None);
//!
//! // Degenerate geometry is rejected
//! let bad = WindowConfig::default().with_radius(0.0);
//! assert_eq!(bad.validate(), Err(ConfigError::ZeroRadius));
//! ```

use core::fmt;

use heapless::String as HString;

use crate::actuator::LinearGeometry;
use crate::limit_switch::TriggerPolarity;
use crate::stepper::{AngleUnit, MotionProfile};

/// Maximum length for short config strings (device names, IDs)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    // Cut on a char boundary so the result stays valid UTF-8
    let mut end = 0;
    for (i, c) in s.char_indices() {
        if i + c.len_utf8() > MAX_SHORT_STRING {
            break;
        }
        end = i + c.len_utf8();
    }
    let _ = hs.push_str(&s[..end]);
    hs
}

// ============================================================================
// Errors
// ============================================================================

/// Rejected configuration value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Radius is zero or not a finite number.
    ZeroRadius,
    /// Steps per revolution is zero.
    ZeroStepsPerRevolution,
    /// Travel length is zero, negative or not finite.
    InvalidLength,
    /// Max speed is zero or not finite.
    InvalidMaxSpeed,
    /// Acceleration is zero or not finite.
    InvalidAcceleration,
    /// STEP or DIR pin is unset.
    MissingRequiredPin,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroRadius => write!(f, "radius must be a non-zero finite value"),
            ConfigError::ZeroStepsPerRevolution => {
                write!(f, "steps per revolution must be positive")
            }
            ConfigError::InvalidLength => write!(f, "travel length must be positive and finite"),
            ConfigError::InvalidMaxSpeed => write!(f, "max speed must be non-zero and finite"),
            ConfigError::InvalidAcceleration => {
                write!(f, "acceleration must be non-zero and finite")
            }
            ConfigError::MissingRequiredPin => write!(f, "step and direction pins are required"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Pins
// ============================================================================

/// GPIO number, or [`PinId::UNSET`] when the line is not wired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PinId(pub u8);

impl PinId {
    /// Sentinel for "not wired".
    pub const UNSET: PinId = PinId(0xFF);

    /// GPIO number, if set.
    #[inline]
    pub const fn get(self) -> Option<u8> {
        if self.0 == Self::UNSET.0 {
            None
        } else {
            Some(self.0)
        }
    }

    /// True if the pin is wired.
    #[inline]
    pub const fn is_set(self) -> bool {
        self.0 != Self::UNSET.0
    }
}

impl Default for PinId {
    fn default() -> Self {
        Self::UNSET
    }
}

impl From<Option<u8>> for PinId {
    fn from(pin: Option<u8>) -> Self {
        pin.map_or(Self::UNSET, PinId)
    }
}

/// Driver pin wiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PinAssignment {
    /// DIR pin (required)
    pub dir: PinId,
    /// STEP pin (required)
    pub step: PinId,
    /// SLEEP pin
    pub sleep: PinId,
    /// ENABLE pin
    pub enable: PinId,
    /// RESET pin
    pub reset: PinId,
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self {
            dir: PinId(4),
            step: PinId(5),
            sleep: PinId(16),
            enable: PinId::UNSET,
            reset: PinId::UNSET,
        }
    }
}

impl PinAssignment {
    /// Set the DIR pin
    pub fn with_dir(mut self, pin: impl Into<PinId>) -> Self {
        self.dir = pin.into();
        self
    }

    /// Set the STEP pin
    pub fn with_step(mut self, pin: impl Into<PinId>) -> Self {
        self.step = pin.into();
        self
    }

    /// Set the SLEEP pin
    pub fn with_sleep(mut self, pin: impl Into<PinId>) -> Self {
        self.sleep = pin.into();
        self
    }

    /// Set the ENABLE pin
    pub fn with_enable(mut self, pin: impl Into<PinId>) -> Self {
        self.enable = pin.into();
        self
    }

    /// Set the RESET pin
    pub fn with_reset(mut self, pin: impl Into<PinId>) -> Self {
        self.reset = pin.into();
        self
    }

    /// Check that STEP and DIR are wired.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step.is_set() && self.dir.is_set() {
            Ok(())
        } else {
            Err(ConfigError::MissingRequiredPin)
        }
    }
}

impl From<u8> for PinId {
    fn from(pin: u8) -> Self {
        PinId(pin)
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
    /// Device ID reported to the management layer
    pub id: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("smart-window"),
            id: short_string("SWALPHA01"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the device ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }
}

// ============================================================================
// Window Config
// ============================================================================

/// Complete window configuration record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WindowConfig {
    /// Driver wiring
    pub pins: PinAssignment,
    /// Swap the open and close directions
    pub inverted: bool,
    /// Full steps (times microsteps) per motor revolution
    pub steps_per_revolution: u32,
    /// Pinion/pulley radius in millimetres
    pub radius_mm: f32,
    /// Full travel from closed to open in millimetres
    pub length_mm: f32,
    /// Cruise speed in degrees/s
    pub max_speed_deg_s: f32,
    /// Acceleration in degrees/s²
    pub acceleration_deg_s2: f32,
    /// Open end-stop input
    pub open_limit_pin: PinId,
    /// Close end-stop input
    pub close_limit_pin: PinId,
    /// Wiring polarity of both end-stops
    pub limit_polarity: TriggerPolarity,
    /// Device identification
    pub device: DeviceConfig,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            pins: PinAssignment::default(),
            inverted: false,
            steps_per_revolution: 200,
            radius_mm: 6.359_439_4,
            length_mm: 500.0,
            max_speed_deg_s: 1080.0,
            acceleration_deg_s2: 360.0,
            open_limit_pin: PinId::UNSET,
            close_limit_pin: PinId::UNSET,
            limit_polarity: TriggerPolarity::ActiveLow,
            device: DeviceConfig::default(),
        }
    }
}

impl WindowConfig {
    /// Set the pin wiring
    pub fn with_pins(mut self, pins: PinAssignment) -> Self {
        self.pins = pins;
        self
    }

    /// Set the inversion flag
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Set steps per revolution
    pub fn with_steps_per_revolution(mut self, steps: u32) -> Self {
        self.steps_per_revolution = steps;
        self
    }

    /// Set the radius (mm)
    pub fn with_radius(mut self, radius_mm: f32) -> Self {
        self.radius_mm = radius_mm;
        self
    }

    /// Set the travel length (mm)
    pub fn with_length(mut self, length_mm: f32) -> Self {
        self.length_mm = length_mm;
        self
    }

    /// Set the cruise speed (degrees/s)
    pub fn with_max_speed(mut self, deg_per_sec: f32) -> Self {
        self.max_speed_deg_s = deg_per_sec;
        self
    }

    /// Set the acceleration (degrees/s²)
    pub fn with_acceleration(mut self, deg_per_sec2: f32) -> Self {
        self.acceleration_deg_s2 = deg_per_sec2;
        self
    }

    /// Set both end-stop inputs
    pub fn with_limit_pins(mut self, open: impl Into<PinId>, close: impl Into<PinId>) -> Self {
        self.open_limit_pin = open.into();
        self.close_limit_pin = close.into();
        self
    }

    /// Set the end-stop polarity
    pub fn with_limit_polarity(mut self, polarity: TriggerPolarity) -> Self {
        self.limit_polarity = polarity;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// True when both end-stop inputs are assigned.
    pub fn has_limit_switches(&self) -> bool {
        self.open_limit_pin.is_set() && self.close_limit_pin.is_set()
    }

    /// Motion profile in degrees, as stored.
    pub fn profile(&self) -> MotionProfile {
        MotionProfile {
            max_speed: self.max_speed_deg_s,
            acceleration: self.acceleration_deg_s2,
            steps_per_revolution: self.steps_per_revolution,
            unit: AngleUnit::Degree,
        }
    }

    /// Linear geometry view of the record.
    pub fn geometry(&self) -> LinearGeometry {
        LinearGeometry {
            radius_mm: self.radius_mm,
            length_mm: self.length_mm,
            inverted: self.inverted,
        }
    }

    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pins.validate()?;
        self.profile().validate()?;
        self.geometry().validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
