//! Type-state builder for `Sorter`.
//!
//! The builder enforces at compile time that both flap servos are provided
//! before `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use sorter_traits::clock::{Clock, MonotonicClock};
use sorter_traits::Servo;

use crate::arming::ArmingState;
use crate::button::ButtonGate;
use crate::config::{ArmingCfg, FlapCfg, MotionCfg, SensorPolarity};
use crate::error::{BuildError, Result};
use crate::flap::Flap;
use crate::sorter::Sorter;
use crate::status::{Counters, Mode};

/// Mechanical range of the servos driving the flaps.
pub const SERVO_MAX_DEG: i32 = 180;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Sorter`. All fields are validated on `build()`.
pub struct SorterBuilder<P, Q> {
    plastic_servo: Option<Box<dyn Servo + Send>>,
    paper_servo: Option<Box<dyn Servo + Send>>,
    plastic_flap: Option<FlapCfg>,
    paper_flap: Option<FlapCfg>,
    polarity: Option<SensorPolarity>,
    motion: Option<MotionCfg>,
    arming: Option<ArmingCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _p: PhantomData<P>,
    _q: PhantomData<Q>,
}

impl Default for SorterBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            plastic_servo: None,
            paper_servo: None,
            plastic_flap: None,
            paper_flap: None,
            polarity: None,
            motion: None,
            arming: None,
            clock: None,
            _p: PhantomData,
            _q: PhantomData,
        }
    }
}

fn validate_flap(flap: &FlapCfg) -> Result<()> {
    let range = 0..=SERVO_MAX_DEG;
    if !range.contains(&flap.home_deg) || !range.contains(&flap.open_deg) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "flap angles must be within 0..=180",
        )));
    }
    if flap.home_deg == flap.open_deg {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "flap open angle must differ from home angle",
        )));
    }
    Ok(())
}

impl<P, Q> SorterBuilder<P, Q> {
    /// Fallible build available in any type-state; returns detailed error for
    /// missing pieces. Both flaps are parked at their home angle.
    pub fn try_build(self) -> Result<Sorter> {
        let plastic_servo = self
            .plastic_servo
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPlasticFlap))?;
        let paper_servo = self
            .paper_servo
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPaperFlap))?;

        let plastic_cfg = self.plastic_flap.unwrap_or_default();
        let paper_cfg = self.paper_flap.unwrap_or_default();
        validate_flap(&plastic_cfg)?;
        validate_flap(&paper_cfg)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        let mut plastic = Flap::from_boxed("plastic", plastic_servo, plastic_cfg);
        let mut paper = Flap::from_boxed("paper", paper_servo, paper_cfg);
        plastic.park()?;
        paper.park()?;

        Ok(Sorter {
            plastic,
            paper,
            polarity: self.polarity.unwrap_or_default(),
            motion: self.motion.unwrap_or_default(),
            arming_cfg: self.arming.unwrap_or_default(),
            clock,
            mode: Mode::Manual,
            counters: Counters::default(),
            arming: ArmingState::new(),
            button: ButtonGate::default(),
            last_raw: None,
        })
    }

    pub fn with_plastic_flap(mut self, flap: FlapCfg) -> Self {
        self.plastic_flap = Some(flap);
        self
    }
    pub fn with_paper_flap(mut self, flap: FlapCfg) -> Self {
        self.paper_flap = Some(flap);
        self
    }
    pub fn with_polarity(mut self, polarity: SensorPolarity) -> Self {
        self.polarity = Some(polarity);
        self
    }
    pub fn with_motion(mut self, motion: MotionCfg) -> Self {
        self.motion = Some(motion);
        self
    }
    pub fn with_arming(mut self, arming: ArmingCfg) -> Self {
        self.arming = Some(arming);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<Q> SorterBuilder<Missing, Q> {
    pub fn with_plastic_servo(
        self,
        servo: impl Servo + Send + 'static,
    ) -> SorterBuilder<Set, Q> {
        SorterBuilder {
            plastic_servo: Some(Box::new(servo)),
            paper_servo: self.paper_servo,
            plastic_flap: self.plastic_flap,
            paper_flap: self.paper_flap,
            polarity: self.polarity,
            motion: self.motion,
            arming: self.arming,
            clock: self.clock,
            _p: PhantomData,
            _q: PhantomData,
        }
    }
}

impl<P> SorterBuilder<P, Missing> {
    pub fn with_paper_servo(self, servo: impl Servo + Send + 'static) -> SorterBuilder<P, Set> {
        SorterBuilder {
            plastic_servo: self.plastic_servo,
            paper_servo: Some(Box::new(servo)),
            plastic_flap: self.plastic_flap,
            paper_flap: self.paper_flap,
            polarity: self.polarity,
            motion: self.motion,
            arming: self.arming,
            clock: self.clock,
            _p: PhantomData,
            _q: PhantomData,
        }
    }
}

impl SorterBuilder<Set, Set> {
    /// Build when both servos are present (compile-time enforced).
    pub fn build(self) -> Result<Sorter> {
        self.try_build()
    }
}
