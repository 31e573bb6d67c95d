//! Automatic-mode arming: decides *when* a detection may trigger a sort.
//!
//! Three gates must all pass on a tick: the single-sensor detection has been
//! continuous for `detect_stable_ms`, `cooldown_ms` has passed since the last
//! automatic sort, and the latch is open. The latch closes on every automatic
//! sort and only reopens once the detection stops being single (cleared or
//! both sensors active), so one physical insertion yields at most one sort.

use std::time::{Duration, Instant};

use crate::classify::DetectionState;
use crate::config::ArmingCfg;

/// Conceptual state, derived from `ArmingState` for status and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmPhase {
    /// No single-sensor detection in progress.
    Idle,
    /// Detection window open but not yet stable, or cooldown pending.
    Detecting,
    /// Next tick with the same detection will sort.
    Ready,
    /// Sorted already; waiting for the detection to clear.
    Latched,
}

impl ArmPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ArmPhase::Idle => "idle",
            ArmPhase::Detecting => "detecting",
            ArmPhase::Ready => "ready",
            ArmPhase::Latched => "latched",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArmingState {
    latched: bool,
    detect_window_start: Option<Instant>,
    last_sort: Option<Instant>,
}

impl ArmingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn detect_window_start(&self) -> Option<Instant> {
        self.detect_window_start
    }

    pub fn last_sort(&self) -> Option<Instant> {
        self.last_sort
    }

    /// Manual -> Automatic. An item already in front of a sensor must clear
    /// before it can be sorted automatically.
    pub fn enter_automatic(&mut self, det: DetectionState) {
        self.latched = det.any();
        self.detect_window_start = None;
    }

    /// Automatic -> Manual.
    pub fn enter_manual(&mut self) {
        self.latched = false;
        self.detect_window_start = None;
    }

    /// Evaluate one tick. Returns `true` when the caller must sort now; the
    /// sort time and latch are recorded before returning.
    pub fn poll(&mut self, now: Instant, det: DetectionState, cfg: &ArmingCfg) -> bool {
        if !det.single() {
            self.latched = false;
            self.detect_window_start = None;
            return false;
        }

        let start = *self.detect_window_start.get_or_insert(now);
        let stable = now.saturating_duration_since(start) >= Duration::from_millis(cfg.detect_stable_ms);
        if self.latched || !stable || !self.cooldown_ok(now, cfg) {
            return false;
        }

        self.last_sort = Some(now);
        self.latched = true;
        true
    }

    pub fn phase(&self, now: Instant, cfg: &ArmingCfg) -> ArmPhase {
        if self.latched {
            return ArmPhase::Latched;
        }
        match self.detect_window_start {
            None => ArmPhase::Idle,
            Some(start)
                if now.saturating_duration_since(start)
                    >= Duration::from_millis(cfg.detect_stable_ms)
                    && self.cooldown_ok(now, cfg) =>
            {
                ArmPhase::Ready
            }
            Some(_) => ArmPhase::Detecting,
        }
    }

    fn cooldown_ok(&self, now: Instant, cfg: &ArmingCfg) -> bool {
        self.last_sort.is_none_or(|t| {
            now.saturating_duration_since(t) >= Duration::from_millis(cfg.cooldown_ms)
        })
    }
}
