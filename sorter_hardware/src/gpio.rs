//! Raspberry Pi backend: `rppal` input pins and software-PWM servos.
use rppal::gpio::{Gpio, InputPin, OutputPin};
use sorter_traits::{DigitalInput, Servo};
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::util::{SERVO_PERIOD, angle_to_pulse};

pub fn open_gpio() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))
}

/// Input line with the pull resistor set against its active level, so an
/// unplugged sensor reads as inactive.
pub struct GpioInput {
    pin: InputPin,
}

impl GpioInput {
    pub fn open(gpio: &Gpio, pin: u8, active_high: bool) -> Result<Self> {
        let p = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("open input pin {pin}: {e}")))?;
        let pin_in = if active_high {
            p.into_input_pulldown()
        } else {
            p.into_input_pullup()
        };
        debug!(pin, active_high, "input pin ready");
        Ok(Self { pin: pin_in })
    }
}

impl DigitalInput for GpioInput {
    fn is_high(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.pin.is_high())
    }
}

/// Hobby servo driven by software PWM on any GPIO pin.
pub struct PwmServo {
    pin: OutputPin,
    bcm: u8,
}

impl PwmServo {
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self> {
        let out = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("open servo pin {pin}: {e}")))?
            .into_output_low();
        debug!(pin, "servo pin ready");
        Ok(Self { pin: out, bcm: pin })
    }
}

impl Servo for PwmServo {
    fn set_angle(
        &mut self,
        degrees: i32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pulse = angle_to_pulse(degrees)?;
        self.pin
            .set_pwm(SERVO_PERIOD, pulse)
            .map_err(|e| HwError::Pwm(format!("servo pin {}: {e}", self.bcm)))?;
        trace!(pin = self.bcm, degrees, pulse_us = pulse.as_micros() as u64, "servo pwm");
        Ok(())
    }
}
