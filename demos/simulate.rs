//! Desktop simulation of the window controller.
//!
//! Runs the full state machine against mock pins, a simulated clock and two
//! simulated end-stops, printing what a real window would do:
//! - A full open and close cycle
//! - An open that hits the end-stop half way
//! - A request into an end-stop that is already triggered
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example simulate
//! ```

use smart_window::hal::{MockClock, MockInput, MockPins};
use smart_window::{
    LimitSensor, LimitSwitch, StepperPins, TriggerPolarity, WindowCommand, WindowConfig,
    WindowController,
};
use smart_window::traits::Clock;

/// One simulated poll every 20 us
const TICK_US: u64 = 20;

fn run_to_rest<P, C, S>(window: &mut WindowController<P, C, S>, clock: &MockClock)
where
    P: StepperPins,
    P::Error: core::fmt::Debug,
    C: Clock,
    S: LimitSensor,
{
    let start_ms = clock.now_ms();
    while window.run().expect("mock pins never fail") {}
    let status = window.status();
    println!(
        "  -> {} at {:.1} mm after {} ms",
        status.state.as_str(),
        status.position_mm,
        clock.now_ms() - start_ms
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================");
    println!("  smart-window simulation");
    println!("=================================");
    println!();

    let config = WindowConfig::default()
        .with_radius(10.0)
        .with_length(300.0)
        .with_max_speed(3600.0)
        .with_acceleration(7200.0);

    let clock = MockClock::ticking(TICK_US);
    let open_pin = MockInput::low();
    let close_pin = MockInput::low();

    let mut window = WindowController::new(&config, MockPins::fully_wired(), &clock)
        .expect("valid config")
        .with_sensors(
            LimitSwitch::new(open_pin.clone(), TriggerPolarity::ActiveHigh),
            LimitSwitch::new(close_pin.clone(), TriggerPolarity::ActiveHigh),
        );
    window.enable().expect("mock pins never fail");

    println!("Full cycle over {} mm:", config.length_mm);
    for cmd in [WindowCommand::Open, WindowCommand::Close] {
        println!("  {} -> {:?}", cmd.as_str(), window.apply(cmd));
        run_to_rest(&mut window, &clock);
    }
    println!();

    println!("Open with the end-stop closing half way:");
    println!("  open -> {:?}", window.apply(WindowCommand::Open));
    while window.status().position_mm < config.length_mm / 2.0 {
        window.run().expect("mock pins never fail");
    }
    open_pin.set_high();
    run_to_rest(&mut window, &clock);
    println!();

    println!("Open again while the end-stop is triggered:");
    println!("  open -> {:?}", window.apply(WindowCommand::Open));
    println!("  close -> {:?}", window.apply(WindowCommand::Close));
    open_pin.set_low();
    run_to_rest(&mut window, &clock);
    println!();

    window.disable().expect("mock pins never fail");
    println!("Final status: {:?}", window.status());
}
