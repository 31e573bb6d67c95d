//! `From` implementations bridging `sorter_config` types to `sorter_core` types.

use crate::config::{ArmingCfg, FlapCfg, MotionCfg, SensorPolarity};

impl From<&sorter_config::Sensors> for SensorPolarity {
    fn from(c: &sorter_config::Sensors) -> Self {
        Self {
            cap_active_high: c.cap_active.is_high(),
            ir_active_high: c.ir_active.is_high(),
        }
    }
}

impl From<&sorter_config::Flap> for FlapCfg {
    fn from(c: &sorter_config::Flap) -> Self {
        Self {
            home_deg: c.home_deg,
            open_deg: c.open_deg,
        }
    }
}

impl From<&sorter_config::Motion> for MotionCfg {
    fn from(c: &sorter_config::Motion) -> Self {
        Self {
            step_delay_ms: c.step_delay_ms,
            settle_ms: c.settle_ms,
        }
    }
}

impl From<&sorter_config::Auto> for ArmingCfg {
    fn from(c: &sorter_config::Auto) -> Self {
        Self {
            detect_stable_ms: c.detect_stable_ms,
            cooldown_ms: c.cooldown_ms,
        }
    }
}
