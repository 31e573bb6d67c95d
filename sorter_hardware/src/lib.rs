pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod util;

use sorter_traits::{DigitalInput, Servo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared handle to a simulated line level; flip it from another thread
/// (or a test) to emulate a sensor or button changing state.
#[derive(Debug, Clone, Default)]
pub struct SimLevel(Arc<AtomicBool>);

impl SimLevel {
    pub fn set(&self, high: bool) {
        self.0.store(high, Ordering::Relaxed);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Simulated digital input backed by a `SimLevel`.
#[derive(Debug, Clone, Default)]
pub struct SimulatedInput {
    level: SimLevel,
}

impl SimulatedInput {
    pub fn new(high: bool) -> Self {
        let level = SimLevel::default();
        level.set(high);
        Self { level }
    }

    /// Handle that drives this input's level.
    pub fn level(&self) -> SimLevel {
        self.level.clone()
    }
}

impl DigitalInput for SimulatedInput {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.level.get())
    }
}

/// Simulated servo that records every commanded angle.
#[derive(Debug, Clone, Default)]
pub struct SimulatedServo {
    history: Arc<Mutex<Vec<i32>>>,
    faulty: bool,
}

impl SimulatedServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// A servo whose every command fails, for exercising fault paths.
    pub fn faulty() -> Self {
        Self {
            history: Arc::default(),
            faulty: true,
        }
    }

    /// Shared view of the commanded angles, oldest first.
    pub fn history(&self) -> Arc<Mutex<Vec<i32>>> {
        self.history.clone()
    }
}

impl Servo for SimulatedServo {
    fn set_angle(&mut self, degrees: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.faulty {
            return Err(Box::new(error::HwError::Pwm("simulated servo fault".into())));
        }
        util::angle_to_pulse(degrees)?;
        tracing::trace!(degrees, "servo angle (simulated)");
        if let Ok(mut h) = self.history.lock() {
            h.push(degrees);
        }
        Ok(())
    }
}
