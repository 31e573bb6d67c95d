//! Runtime configuration for the sorting engine.
//!
//! These are separate from the TOML-deserialized config in `sorter_config`;
//! see `conversions` for the bridge.

/// Which electrical level means "detected" for each sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorPolarity {
    pub cap_active_high: bool,
    pub ir_active_high: bool,
}

impl Default for SensorPolarity {
    fn default() -> Self {
        // Capacitive modules pull high on detection, IR obstacle modules pull low.
        Self {
            cap_active_high: true,
            ir_active_high: false,
        }
    }
}

/// Home/open angle pair of one flap, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlapCfg {
    pub home_deg: i32,
    pub open_deg: i32,
}

impl Default for FlapCfg {
    fn default() -> Self {
        Self {
            home_deg: 0,
            open_deg: 90,
        }
    }
}

/// Flap motion timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCfg {
    /// Pause after each one-degree step.
    pub step_delay_ms: u64,
    /// Hold at the open angle so the item can fall clear.
    pub settle_ms: u64,
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self {
            step_delay_ms: 15,
            settle_ms: 1000,
        }
    }
}

/// Automatic-mode gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmingCfg {
    /// A single-sensor detection must persist this long before it counts.
    pub detect_stable_ms: u64,
    /// Minimum spacing between automatic sorts.
    pub cooldown_ms: u64,
}

impl Default for ArmingCfg {
    fn default() -> Self {
        Self {
            detect_stable_ms: 300,
            cooldown_ms: 2000,
        }
    }
}
