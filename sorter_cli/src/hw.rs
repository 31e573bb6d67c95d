//! Hardware assembly: real GPIO with the `hardware` feature, simulation otherwise.

use sorter_config::Config;
use sorter_core::SensorInputs;
use sorter_traits::Servo;

/// Everything the engine needs from the outside world.
pub struct Hardware {
    pub plastic: Box<dyn Servo + Send>,
    pub paper: Box<dyn Servo + Send>,
    pub inputs: SensorInputs,
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open(cfg: &Config) -> eyre::Result<Hardware> {
    use eyre::WrapErr;
    use sorter_core::hw_error::map_hw_error;
    use sorter_hardware::error::HwError;
    use sorter_hardware::gpio::{GpioInput, PwmServo, open_gpio};

    fn hw(e: HwError) -> eyre::Report {
        eyre::Report::new(map_hw_error(&e))
    }

    let gpio = open_gpio().map_err(hw)?;
    let pins = &cfg.pins;
    let cap = GpioInput::open(&gpio, pins.cap_sensor, cfg.sensors.cap_active.is_high())
        .map_err(hw)
        .wrap_err("open capacitive sensor")?;
    let ir = GpioInput::open(&gpio, pins.ir_sensor, cfg.sensors.ir_active.is_high())
        .map_err(hw)
        .wrap_err("open IR sensor")?;
    let mut inputs = SensorInputs::new(cap, ir);
    if let Some(pin) = pins.button {
        let active_high = cfg.sensors.button_active.is_high();
        let button = GpioInput::open(&gpio, pin, active_high)
            .map_err(hw)
            .wrap_err("open manual button")?;
        inputs = inputs.with_button(button, active_high);
    }
    let plastic = PwmServo::open(&gpio, pins.plastic_servo)
        .map_err(hw)
        .wrap_err("open plastic servo")?;
    let paper = PwmServo::open(&gpio, pins.paper_servo)
        .map_err(hw)
        .wrap_err("open paper servo")?;
    tracing::info!(
        cap = pins.cap_sensor,
        ir = pins.ir_sensor,
        button = ?pins.button,
        plastic = pins.plastic_servo,
        paper = pins.paper_servo,
        "gpio hardware ready"
    );
    Ok(Hardware {
        plastic: Box::new(plastic),
        paper: Box::new(paper),
        inputs,
    })
}

/// Simulated backend. Input levels come from `SORTER_SIM_CAP`, `SORTER_SIM_IR`
/// and `SORTER_SIM_BUTTON` (each sensor defaults to its inactive level);
/// `SORTER_SIM_FAULT=1` makes both servos fail.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open(cfg: &Config) -> eyre::Result<Hardware> {
    use sorter_hardware::{SimulatedInput, SimulatedServo};

    let sensors = &cfg.sensors;
    let cap = sim_level("SORTER_SIM_CAP", !sensors.cap_active.is_high())?;
    let ir = sim_level("SORTER_SIM_IR", !sensors.ir_active.is_high())?;
    let mut inputs = SensorInputs::new(SimulatedInput::new(cap), SimulatedInput::new(ir));
    if cfg.pins.button.is_some() {
        let active_high = sensors.button_active.is_high();
        let level = sim_level("SORTER_SIM_BUTTON", !active_high)?;
        inputs = inputs.with_button(SimulatedInput::new(level), active_high);
    }

    let fault = sim_level("SORTER_SIM_FAULT", false)?;
    let servo = || {
        if fault {
            SimulatedServo::faulty()
        } else {
            SimulatedServo::new()
        }
    };
    tracing::info!(cap, ir, fault, "simulated hardware ready");
    Ok(Hardware {
        plastic: Box::new(servo()),
        paper: Box::new(servo()),
        inputs,
    })
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn sim_level(var: &str, default: bool) -> eyre::Result<bool> {
    match std::env::var(var) {
        Ok(v) => match v.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => eyre::bail!("{var} must be 0 or 1, got {other:?}"),
        },
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => eyre::bail!("{var}: {e}"),
    }
}
