//! ESP32 smart window controller.
//!
//! This is the main entry point for the physical hardware controller.
//! It runs a polling loop that:
//! - Reads `open` / `close` / `stop` / `status` lines from the serial console
//! - Ticks the window state machine as fast as the step rate requires
//! - Wakes the stepper driver for a move and puts it to sleep afterwards
//! - Prints a status line while the window is moving
//!
//! # Configuration
//!
//! Geometry and end-stop pins can be set at build time:
//!
//! ```bash
//! WINDOW_LENGTH_MM=420 WINDOW_OPEN_LIMIT_PIN=12 WINDOW_CLOSE_LIMIT_PIN=13 \
//!     cargo build --release --features esp32 --bin esp32_main
//! ```

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use smart_window::hal::esp32::{limit_switch, stepper_pins, Esp32Clock};
use smart_window::traits::Clock;
use smart_window::{PinId, WindowCommand, WindowConfig, WindowController};

/// Sleep between polls while the window is at rest
const IDLE_POLL_MS: u64 = 10;

/// Yield to other tasks after this many busy polls while moving
const YIELD_EVERY: u32 = 4096;

/// Status print interval while moving
const REPORT_INTERVAL_MS: u64 = 1000;

fn env_f32(value: Option<&str>, default: f32) -> anyhow::Result<f32> {
    match value {
        Some(text) => text.parse().with_context(|| format!("invalid number {:?}", text)),
        None => Ok(default),
    }
}

fn env_pin(value: Option<&str>) -> anyhow::Result<PinId> {
    match value {
        Some(text) => Ok(PinId(text.parse().with_context(|| format!("invalid pin {:?}", text))?)),
        None => Ok(PinId::UNSET),
    }
}

fn load_config() -> anyhow::Result<WindowConfig> {
    let defaults = WindowConfig::default();
    let config = defaults
        .clone()
        .with_length(env_f32(option_env!("WINDOW_LENGTH_MM"), defaults.length_mm)?)
        .with_radius(env_f32(option_env!("WINDOW_RADIUS_MM"), defaults.radius_mm)?)
        .with_inverted(option_env!("WINDOW_INVERTED").is_some_and(|v| v == "1" || v == "true"))
        .with_limit_pins(
            env_pin(option_env!("WINDOW_OPEN_LIMIT_PIN"))?,
            env_pin(option_env!("WINDOW_CLOSE_LIMIT_PIN"))?,
        );
    config.validate()?;
    Ok(config)
}

/// Forward console lines as commands.
fn spawn_console(tx: mpsc::Sender<ConsoleRequest>) -> anyhow::Result<()> {
    thread::Builder::new()
        .stack_size(4096)
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { continue };
                let request = if line.trim().eq_ignore_ascii_case("status") {
                    ConsoleRequest::Status
                } else if let Some(cmd) = WindowCommand::from_text(&line) {
                    ConsoleRequest::Command(cmd)
                } else {
                    if !line.trim().is_empty() {
                        println!("? unknown command {:?} (open, close, stop, status)", line.trim());
                    }
                    continue;
                };
                if tx.send(request).is_err() {
                    break;
                }
            }
        })
        .context("spawning console thread")?;
    Ok(())
}

enum ConsoleRequest {
    Command(WindowCommand),
    Status,
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  smart-window controller");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    // Geometry and end-stop pins come from build-time environment variables
    let config = load_config()?;
    println!(
        "[OK] Config: {} length {} mm, radius {} mm",
        config.device.id, config.length_mm, config.radius_mm
    );

    // =========================================================================
    // Initialize Stepper and End-stops
    // =========================================================================
    let pins = stepper_pins(&config.pins)?;
    println!(
        "[OK] Stepper initialized (STEP GPIO{:?}, DIR GPIO{:?}, SLEEP {:?})",
        config.pins.step.get(),
        config.pins.dir.get(),
        config.pins.sleep.get()
    );

    let open_switch = limit_switch(config.open_limit_pin, config.limit_polarity)?;
    let close_switch = limit_switch(config.close_limit_pin, config.limit_polarity)?;

    let clock = Esp32Clock::new();
    let mut window = WindowController::new(&config, pins, &clock)?
        .with_optional_sensors(open_switch, close_switch);
    window
        .disable()
        .map_err(|e| anyhow::anyhow!("driver sleep failed: {:?}", e))?;

    if window.has_interlock() {
        println!(
            "[OK] End-stops on GPIO{:?} / GPIO{:?}",
            config.open_limit_pin.get(),
            config.close_limit_pin.get()
        );
    } else {
        println!("[SKIP] End-stops not configured, interlock disabled");
    }

    // =========================================================================
    // Console
    // =========================================================================
    let (tx, rx) = mpsc::channel();
    spawn_console(tx)?;

    println!();
    println!("Commands: open | close | stop | status");
    println!();

    // =========================================================================
    // Main Control Loop
    // =========================================================================
    let mut was_running = false;
    let mut busy_polls: u32 = 0;
    let mut last_report_ms = clock.now_ms();

    loop {
        while let Ok(request) = rx.try_recv() {
            match request {
                ConsoleRequest::Command(cmd) => {
                    if cmd != WindowCommand::Stop {
                        window
                            .enable()
                            .map_err(|e| anyhow::anyhow!("driver wake failed: {:?}", e))?;
                    }
                    let outcome = window.apply(cmd);
                    println!("{} -> {:?}", cmd.as_str(), outcome);
                    // Nothing scheduled and nothing in flight: back to sleep
                    if !outcome.is_accepted() && !window.actuator().is_running() {
                        window
                            .disable()
                            .map_err(|e| anyhow::anyhow!("driver sleep failed: {:?}", e))?;
                    }
                }
                ConsoleRequest::Status => println!("{:?}", window.status()),
            }
        }

        let running = window
            .run()
            .map_err(|e| anyhow::anyhow!("step output failed: {:?}", e))?;

        if running {
            busy_polls = busy_polls.wrapping_add(1);
            if busy_polls % YIELD_EVERY == 0 {
                thread::yield_now();
            }
            let now = clock.now_ms();
            if now - last_report_ms >= REPORT_INTERVAL_MS {
                last_report_ms = now;
                let status = window.status();
                println!(
                    "{} {:.1} mm ({:.1} mm to go)",
                    status.state.as_str(),
                    status.position_mm,
                    status.remaining_mm
                );
            }
        } else {
            if was_running {
                let status = window.status();
                println!("idle at {:.1} mm", status.position_mm);
                window
                    .disable()
                    .map_err(|e| anyhow::anyhow!("driver sleep failed: {:?}", e))?;
            }
            thread::sleep(Duration::from_millis(IDLE_POLL_MS));
        }
        was_running = running;
    }
}
