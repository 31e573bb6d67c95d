use std::time::Duration;

use crate::error::{HwError, Result};

/// Standard hobby-servo frame period (50 Hz).
pub const SERVO_PERIOD: Duration = Duration::from_millis(20);
/// Pulse width commanding 0°.
pub const SERVO_MIN_PULSE_US: u64 = 500;
/// Pulse width commanding 180°.
pub const SERVO_MAX_PULSE_US: u64 = 2500;
pub const SERVO_MAX_DEG: i32 = 180;

/// Map an angle to the pulse width a hobby servo expects, linearly over
/// `SERVO_MIN_PULSE_US..=SERVO_MAX_PULSE_US`.
pub fn angle_to_pulse(degrees: i32) -> Result<Duration> {
    if !(0..=SERVO_MAX_DEG).contains(&degrees) {
        return Err(HwError::AngleOutOfRange(degrees));
    }
    let span = SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US;
    let us = SERVO_MIN_PULSE_US + span * degrees as u64 / SERVO_MAX_DEG as u64;
    Ok(Duration::from_micros(us))
}
