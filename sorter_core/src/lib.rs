#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core sorting logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent sorting engine. All hardware
//! interactions go through `sorter_traits::DigitalInput` and `sorter_traits::Servo`.
//!
//! ## Architecture
//!
//! - **Classification**: raw levels + polarity -> detection -> outcome (`classify`)
//! - **Actuation**: stepped flap motion with settle hold (`flap`)
//! - **Arming**: stability window, cooldown and latch for Automatic mode (`arming`)
//! - **Engine**: mode, counters and the sort entry points (`Sorter`)
//! - **Control loop**: fixed-period polling plus a serialized command queue (`runner`)

pub mod arming;
pub mod builder;
pub mod button;
pub mod classify;
pub mod config;
pub mod conversions;
pub mod error;
pub mod flap;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod sorter;
pub mod status;

pub use arming::{ArmPhase, ArmingState};
pub use builder::{SERVO_MAX_DEG, SorterBuilder};
pub use classify::{Category, DetectionState, Outcome, RawInputs, classify, decide};
pub use config::{ArmingCfg, FlapCfg, MotionCfg, SensorPolarity};
pub use error::{BuildError, Result, SorterError};
pub use flap::Flap;
pub use runner::{
    CommandQueue, ControlHandle, ControlSurface, RunParams, RunSummary, SensorInputs,
    command_queue, run,
};
pub use sorter::Sorter;
pub use status::{Counters, Mode, Status};
