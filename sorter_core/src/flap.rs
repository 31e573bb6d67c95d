//! Open-loop flap driver: one-degree steps at a fixed rate.

use std::time::Duration;

use eyre::WrapErr;
use sorter_traits::{Clock, Servo};

use crate::config::{FlapCfg, MotionCfg};
use crate::error::Result;
use crate::hw_error::map_hw_error;

/// One servo-driven flap and its last commanded angle.
pub struct Flap {
    name: &'static str,
    servo: Box<dyn Servo + Send>,
    cfg: FlapCfg,
    current_deg: i32,
}

impl core::fmt::Debug for Flap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Flap")
            .field("name", &self.name)
            .field("cfg", &self.cfg)
            .field("current_deg", &self.current_deg)
            .finish()
    }
}

impl Flap {
    /// Tracks the flap as resting at its home angle; nothing is commanded
    /// until `park` or a move.
    pub fn new(name: &'static str, servo: impl Servo + Send + 'static, cfg: FlapCfg) -> Self {
        Self::from_boxed(name, Box::new(servo), cfg)
    }

    pub(crate) fn from_boxed(name: &'static str, servo: Box<dyn Servo + Send>, cfg: FlapCfg) -> Self {
        Self {
            name,
            servo,
            cfg,
            current_deg: cfg.home_deg,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cfg(&self) -> FlapCfg {
        self.cfg
    }

    /// Last angle successfully commanded.
    pub fn current_deg(&self) -> i32 {
        self.current_deg
    }

    /// Command the home angle directly, without stepping.
    pub fn park(&mut self) -> Result<()> {
        let home = self.cfg.home_deg;
        self.command(home)?;
        self.current_deg = home;
        Ok(())
    }

    /// Step toward `target` one degree at a time, sleeping `step_delay` after
    /// each step. Returns the number of steps taken.
    pub fn move_to(&mut self, target: i32, step_delay: Duration, clock: &dyn Clock) -> Result<u32> {
        let mut steps = 0u32;
        while self.current_deg != target {
            let next = self.current_deg + (target - self.current_deg).signum();
            self.command(next)?;
            self.current_deg = next;
            steps += 1;
            clock.sleep(step_delay);
        }
        Ok(steps)
    }

    /// Open, hold for the settle delay, close again.
    pub fn cycle(&mut self, motion: &MotionCfg, clock: &dyn Clock) -> Result<()> {
        let step = Duration::from_millis(motion.step_delay_ms);
        let opened = self.move_to(self.cfg.open_deg, step, clock)?;
        clock.sleep(Duration::from_millis(motion.settle_ms));
        let closed = self.move_to(self.cfg.home_deg, step, clock)?;
        tracing::debug!(flap = self.name, opened, closed, "flap cycle done");
        Ok(())
    }

    fn command(&mut self, deg: i32) -> Result<()> {
        self.servo
            .set_angle(deg)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("moving {} flap to {deg}", self.name))
    }
}
