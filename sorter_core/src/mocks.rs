//! Test and helper doubles for sorter_core.
//!
//! Deterministic stand-ins for the hardware seams: a clock that only moves
//! when told to, a servo that records commands, and an input whose level is
//! shared with the test.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sorter_traits::{Clock, DigitalInput, Servo};

/// Clock whose time advances only through `advance` or `sleep`.
///
/// now() = origin + offset
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Total simulated time since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Servo that records every commanded angle; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingServo {
    angles: Arc<Mutex<Vec<i32>>>,
}

impl RecordingServo {
    pub fn angles(&self) -> Vec<i32> {
        self.angles.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.angles.lock() {
            g.clear();
        }
    }
}

impl Servo for RecordingServo {
    fn set_angle(&mut self, degrees: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut g) = self.angles.lock() {
            g.push(degrees);
        }
        Ok(())
    }
}

/// Servo that rejects every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingServo;

impl Servo for FailingServo {
    fn set_angle(&mut self, _degrees: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("servo unplugged")))
    }
}

/// Digital input whose level is shared with its clones.
#[derive(Debug, Clone, Default)]
pub struct SharedInput(Arc<AtomicBool>);

impl SharedInput {
    pub fn new(high: bool) -> Self {
        Self(Arc::new(AtomicBool::new(high)))
    }

    pub fn set(&self, high: bool) {
        self.0.store(high, Ordering::Relaxed);
    }
}

impl DigitalInput for SharedInput {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.load(Ordering::Relaxed))
    }
}
