//! Mode, counters and the status snapshot served to the control surface.

use crate::arming::ArmPhase;
use crate::classify::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Manual,
    Automatic,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Manual => "manual",
            Mode::Automatic => "automatic",
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running totals since start or the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub biodegradable: u64,
    pub non_biodegradable: u64,
}

impl Counters {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Biodegradable => self.biodegradable,
            Category::NonBiodegradable => self.non_biodegradable,
        }
    }

    pub(crate) fn bump(&mut self, category: Category) {
        match category {
            Category::Biodegradable => self.biodegradable += 1,
            Category::NonBiodegradable => self.non_biodegradable += 1,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of everything the control surface reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub mode: Mode,
    pub counters: Counters,
    pub phase: ArmPhase,
}
