//! Sensor classification and the sort decision policy.
//!
//! Both functions are pure: raw levels plus polarity in, detection out;
//! detection in, outcome out. Side effects live in `Sorter::apply`.

use crate::config::SensorPolarity;

/// Electrical levels read from the two sensors in one tick (`true` = high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawInputs {
    pub cap_high: bool,
    pub ir_high: bool,
}

impl RawInputs {
    pub const fn new(cap_high: bool, ir_high: bool) -> Self {
        Self { cap_high, ir_high }
    }
}

/// Per-sensor detection after polarity has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectionState {
    pub cap_detected: bool,
    pub ir_detected: bool,
}

impl DetectionState {
    /// Exactly one sensor reports detection.
    #[inline]
    pub fn single(self) -> bool {
        self.cap_detected ^ self.ir_detected
    }

    /// At least one sensor reports detection.
    #[inline]
    pub fn any(self) -> bool {
        self.cap_detected || self.ir_detected
    }
}

/// A sensor detects when its raw level equals its configured active level.
#[inline]
pub fn classify(raw: RawInputs, polarity: &SensorPolarity) -> DetectionState {
    DetectionState {
        cap_detected: raw.cap_high == polarity.cap_active_high,
        ir_detected: raw.ir_high == polarity.ir_active_high,
    }
}

/// Waste stream an item is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Paper, seen by the IR sensor only.
    Biodegradable,
    /// Plastic, seen by the capacitive sensor only.
    NonBiodegradable,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Biodegradable => "biodegradable",
            Category::NonBiodegradable => "non_biodegradable",
        }
    }
}

/// Result of one classification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Plastic,
    Paper,
    /// Nothing in front of either sensor.
    NoItem,
    /// Both sensors fired; skipped rather than risk misrouting.
    Ambiguous,
}

impl Outcome {
    /// Category to actuate, if this outcome sorts anything.
    pub fn category(self) -> Option<Category> {
        match self {
            Outcome::Plastic => Some(Category::NonBiodegradable),
            Outcome::Paper => Some(Category::Biodegradable),
            Outcome::NoItem | Outcome::Ambiguous => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Plastic => "plastic",
            Outcome::Paper => "paper",
            Outcome::NoItem => "none",
            Outcome::Ambiguous => "ambiguous",
        }
    }
}

impl core::fmt::Display for Outcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ambiguity first, then capacitive, then IR.
pub fn decide(state: DetectionState) -> Outcome {
    match (state.cap_detected, state.ir_detected) {
        (true, true) => Outcome::Ambiguous,
        (true, false) => Outcome::Plastic,
        (false, true) => Outcome::Paper,
        (false, false) => Outcome::NoItem,
    }
}
