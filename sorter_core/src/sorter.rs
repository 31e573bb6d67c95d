//! The sorting engine (`Sorter`).
//!
//! Owns the two flaps, the operating mode, the counters and the arming state.
//! Every entry point (automatic tick, manual trigger, button) funnels into
//! `sort`, so both paths decide and actuate identically.

use std::sync::Arc;

use sorter_traits::Clock;

use crate::arming::{ArmPhase, ArmingState};
use crate::builder::{Missing, SorterBuilder};
use crate::button::ButtonGate;
use crate::classify::{Category, DetectionState, Outcome, RawInputs, classify, decide};
use crate::config::{ArmingCfg, MotionCfg, SensorPolarity};
use crate::error::Result;
use crate::flap::Flap;
use crate::status::{Counters, Mode, Status};

pub struct Sorter {
    pub(crate) plastic: Flap,
    pub(crate) paper: Flap,
    pub(crate) polarity: SensorPolarity,
    pub(crate) motion: MotionCfg,
    pub(crate) arming_cfg: ArmingCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,

    pub(crate) mode: Mode,
    pub(crate) counters: Counters,
    pub(crate) arming: ArmingState,
    pub(crate) button: ButtonGate,
    pub(crate) last_raw: Option<RawInputs>,
}

impl core::fmt::Debug for Sorter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sorter")
            .field("mode", &self.mode)
            .field("counters", &self.counters)
            .field("latched", &self.arming.is_latched())
            .field("plastic_deg", &self.plastic.current_deg())
            .field("paper_deg", &self.paper.current_deg())
            .finish()
    }
}

impl Sorter {
    /// Start building a Sorter.
    pub fn builder() -> SorterBuilder<Missing, Missing> {
        SorterBuilder::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    pub fn flap(&self, category: Category) -> &Flap {
        match category {
            Category::NonBiodegradable => &self.plastic,
            Category::Biodegradable => &self.paper,
        }
    }

    /// Most recent raw readings, if any were observed yet.
    pub fn last_raw(&self) -> Option<RawInputs> {
        self.last_raw
    }

    /// Detection derived from the most recent raw readings; nothing is
    /// detected before the first observation.
    pub fn detection(&self) -> DetectionState {
        self.last_raw
            .map(|raw| classify(raw, &self.polarity))
            .unwrap_or_default()
    }

    pub fn arm_phase(&self) -> ArmPhase {
        if self.mode == Mode::Manual {
            return ArmPhase::Idle;
        }
        self.arming.phase(self.clock.now(), &self.arming_cfg)
    }

    pub fn status(&self) -> Status {
        Status {
            mode: self.mode,
            counters: self.counters,
            phase: self.arm_phase(),
        }
    }

    /// Record the latest raw readings without evaluating anything.
    pub fn observe(&mut self, raw: RawInputs) -> DetectionState {
        if self.last_raw != Some(raw) {
            let det = classify(raw, &self.polarity);
            tracing::trace!(
                cap_high = raw.cap_high,
                ir_high = raw.ir_high,
                cap = det.cap_detected,
                ir = det.ir_detected,
                "inputs changed"
            );
        }
        self.last_raw = Some(raw);
        self.detection()
    }

    /// Switch mode. Only a real transition touches the arming state; entering
    /// Automatic uses the detection at this instant. Returns whether the mode
    /// changed.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }
        match mode {
            Mode::Automatic => self.arming.enter_automatic(self.detection()),
            Mode::Manual => self.arming.enter_manual(),
        }
        self.mode = mode;
        tracing::info!(
            mode = mode.as_str(),
            latched = self.arming.is_latched(),
            "mode changed"
        );
        true
    }

    pub fn reset_counters(&mut self) {
        let before = self.counters;
        self.counters.reset();
        tracing::info!(
            biodegradable = before.biodegradable,
            non_biodegradable = before.non_biodegradable,
            "counters reset"
        );
    }

    /// Classify `raw` and sort once, ungated, in any mode.
    pub fn trigger_manual_sort(&mut self, raw: RawInputs) -> Result<Outcome> {
        self.observe(raw);
        let outcome = self.sort(raw)?;
        tracing::info!(outcome = outcome.as_str(), "manual sort");
        Ok(outcome)
    }

    /// Feed one poll of the manual button. Sorts the last observed readings
    /// on a fresh press while in Manual mode. The repeat lockout runs from
    /// the end of the sort.
    pub fn press_button(&mut self, pressed: bool) -> Result<Option<Outcome>> {
        let now = self.clock.now();
        if !self.button.poll(pressed, now, self.mode == Mode::Manual) {
            return Ok(None);
        }
        tracing::debug!("manual button pressed");
        let Some(raw) = self.last_raw else {
            return Ok(None);
        };
        let outcome = self.trigger_manual_sort(raw)?;
        self.button.restart_lockout(self.clock.now());
        Ok(Some(outcome))
    }

    /// One control-loop tick. In Automatic mode the arming state decides
    /// whether `raw` is sorted now; in Manual mode only the readings are kept.
    pub fn tick(&mut self, raw: RawInputs) -> Result<Option<Outcome>> {
        let det = self.observe(raw);
        if self.mode != Mode::Automatic {
            return Ok(None);
        }
        let now = self.clock.now();
        if !self.arming.poll(now, det, &self.arming_cfg) {
            return Ok(None);
        }
        let outcome = self.sort(raw)?;
        tracing::info!(outcome = outcome.as_str(), "automatic sort");
        Ok(Some(outcome))
    }

    /// Classify, decide, apply.
    fn sort(&mut self, raw: RawInputs) -> Result<Outcome> {
        let outcome = decide(classify(raw, &self.polarity));
        self.apply(outcome)?;
        Ok(outcome)
    }

    /// Run the flap cycle for a sorting outcome, then count it. Outcomes
    /// without a category move nothing and count nothing.
    pub fn apply(&mut self, outcome: Outcome) -> Result<()> {
        let Some(category) = outcome.category() else {
            if outcome == Outcome::Ambiguous {
                tracing::warn!("both sensors active; item skipped");
            } else {
                tracing::debug!("no item present");
            }
            return Ok(());
        };

        let flap = match category {
            Category::NonBiodegradable => &mut self.plastic,
            Category::Biodegradable => &mut self.paper,
        };
        tracing::debug!(
            flap = flap.name(),
            open_deg = flap.cfg().open_deg,
            "flap cycle start"
        );
        flap.cycle(&self.motion, self.clock.as_ref())?;
        self.counters.bump(category);
        tracing::info!(
            category = category.as_str(),
            count = self.counters.get(category),
            "item sorted"
        );
        Ok(())
    }
}
