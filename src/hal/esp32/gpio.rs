//! Step/direction pins and end-stop inputs on ESP-IDF GPIOs.
//!
//! Pins come from a [`PinAssignment`] (GPIO numbers), so a persisted
//! configuration can rewire the board without a rebuild. Unset optional
//! lines stay `None` and are never driven.
//!
//! STEP pulses use [`Ets`] (busy-wait in ROM) for microsecond accuracy; the
//! 2 ms wake delay goes through the same delay.

use anyhow::{bail, Context};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver, Pull};

use crate::config::{PinAssignment, PinId};
use crate::hal::StepDirPins;
use crate::limit_switch::{LimitSwitch, TriggerPolarity};

/// Output pin driver used for every stepper line.
pub type Esp32Output = PinDriver<'static, AnyOutputPin, Output>;

/// Step/direction driver on ESP32 GPIOs.
pub type Esp32StepperPins =
    StepDirPins<Esp32Output, Esp32Output, Esp32Output, Esp32Output, Esp32Output, Ets>;

/// End-stop switch on an ESP32 GPIO.
pub type Esp32LimitSwitch = LimitSwitch<PinDriver<'static, AnyInputPin, Input>>;

fn output(pin: u8) -> anyhow::Result<Esp32Output> {
    // Safe: each GPIO number is claimed once, from a validated assignment
    let any = unsafe { AnyOutputPin::new(i32::from(pin)) };
    let mut driver = PinDriver::output(any).with_context(|| format!("GPIO{} as output", pin))?;
    driver.set_low()?;
    Ok(driver)
}

fn optional_output(pin: PinId) -> anyhow::Result<Option<Esp32Output>> {
    pin.get().map(output).transpose()
}

/// Claim the stepper GPIOs described by `pins`.
///
/// All lines start low, which leaves a wired SLEEP line asleep.
///
/// # Errors
///
/// Fails if STEP or DIR is unset or a GPIO cannot be configured.
pub fn stepper_pins(pins: &PinAssignment) -> anyhow::Result<Esp32StepperPins> {
    let (Some(step), Some(dir)) = (pins.step.get(), pins.dir.get()) else {
        bail!("step and direction pins are required");
    };
    Ok(StepDirPins::from_parts(
        output(step)?,
        output(dir)?,
        optional_output(pins.sleep)?,
        optional_output(pins.enable)?,
        optional_output(pins.reset)?,
        Ets,
    ))
}

/// Claim an end-stop input, or `None` if `pin` is unset.
///
/// Active-low switches get the internal pull-up, active-high ones the
/// pull-down.
pub fn limit_switch(pin: PinId, polarity: TriggerPolarity) -> anyhow::Result<Option<Esp32LimitSwitch>> {
    let Some(gpio) = pin.get() else {
        return Ok(None);
    };
    // Safe: as for outputs, each GPIO number is claimed once
    let any = unsafe { AnyInputPin::new(i32::from(gpio)) };
    let mut driver = PinDriver::input(any).with_context(|| format!("GPIO{} as input", gpio))?;
    let pull = match polarity {
        TriggerPolarity::ActiveLow => Pull::Up,
        TriggerPolarity::ActiveHigh => Pull::Down,
    };
    driver.set_pull(pull)?;
    Ok(Some(LimitSwitch::new(driver, polarity)))
}
