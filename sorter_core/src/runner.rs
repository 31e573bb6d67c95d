//! Control loop and the command queue that serializes control-surface requests.
//!
//! The loop thread is the only owner of the `Sorter`. Other threads reach it
//! through a `ControlHandle`, which pushes one request at a time into a
//! single-slot channel and blocks until the loop replies. The loop drains the
//! slot once per tick, so a request made while a flap is moving is served
//! after the sort finishes.
//!
//! Never call a `ControlHandle` from the thread running `run`: the request
//! would wait on a loop that is itself waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel as xch;
use eyre::WrapErr;
use sorter_traits::DigitalInput;

use crate::classify::{Outcome, RawInputs};
use crate::error::{Result, SorterError, as_sorter_error};
use crate::hw_error::map_hw_error;
use crate::sorter::Sorter;
use crate::status::{Mode, Status};

/// Operations offered to an external transport (HTTP, CLI, tests).
pub trait ControlSurface: Send + Sync {
    fn status(&self) -> Result<Status>;
    fn set_mode(&self, mode: Mode) -> Result<()>;
    /// Sort whatever the sensors currently see, ungated.
    fn manual_sort(&self) -> Result<Outcome>;
    fn reset_counters(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Status,
    SetMode(Mode),
    ManualSort,
    ResetCounters,
}

#[derive(Debug)]
enum Reply {
    Status(Status),
    Done,
    Sorted(Outcome),
    Failed(SorterError),
}

struct Request {
    cmd: Command,
    reply: xch::Sender<Reply>,
}

/// Cloneable client side of the command queue.
#[derive(Clone)]
pub struct ControlHandle {
    tx: xch::Sender<Request>,
}

/// Loop side of the command queue.
pub struct CommandQueue {
    rx: xch::Receiver<Request>,
}

/// Create a connected handle/queue pair with a single pending slot.
pub fn command_queue() -> (ControlHandle, CommandQueue) {
    let (tx, rx) = xch::bounded(1);
    (ControlHandle { tx }, CommandQueue { rx })
}

impl ControlHandle {
    fn call(&self, cmd: Command) -> Result<Reply> {
        let (reply, rx) = xch::bounded(1);
        self.tx
            .send(Request { cmd, reply })
            .map_err(|_| eyre::Report::new(SorterError::LoopStopped))?;
        match rx.recv() {
            Ok(Reply::Failed(e)) => Err(eyre::Report::new(e)),
            Ok(r) => Ok(r),
            Err(_) => Err(eyre::Report::new(SorterError::LoopStopped)),
        }
    }
}

fn unexpected(reply: Reply) -> eyre::Report {
    eyre::Report::new(SorterError::State(format!("unexpected reply {reply:?}")))
}

impl ControlSurface for ControlHandle {
    fn status(&self) -> Result<Status> {
        match self.call(Command::Status)? {
            Reply::Status(s) => Ok(s),
            other => Err(unexpected(other)),
        }
    }

    fn set_mode(&self, mode: Mode) -> Result<()> {
        match self.call(Command::SetMode(mode))? {
            Reply::Done => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    fn manual_sort(&self) -> Result<Outcome> {
        match self.call(Command::ManualSort)? {
            Reply::Sorted(o) => Ok(o),
            other => Err(unexpected(other)),
        }
    }

    fn reset_counters(&self) -> Result<()> {
        match self.call(Command::ResetCounters)? {
            Reply::Done => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

impl CommandQueue {
    /// Requests waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Serve every pending request against `sorter`. A failed sort is replied
    /// to and then returned, which stops the loop.
    pub fn drain(&self, sorter: &mut Sorter) -> Result<usize> {
        let mut served = 0;
        while let Ok(req) = self.rx.try_recv() {
            served += 1;
            let result = match req.cmd {
                Command::Status => Ok(Reply::Status(sorter.status())),
                Command::SetMode(mode) => {
                    sorter.set_mode(mode);
                    Ok(Reply::Done)
                }
                Command::ResetCounters => {
                    sorter.reset_counters();
                    Ok(Reply::Done)
                }
                Command::ManualSort => match sorter.last_raw() {
                    Some(raw) => sorter.trigger_manual_sort(raw).map(Reply::Sorted),
                    None => Ok(Reply::Sorted(Outcome::NoItem)),
                },
            };
            match result {
                // A requester that gave up is not an error for the loop.
                Ok(reply) => {
                    let _ = req.reply.send(reply);
                }
                Err(e) => {
                    let _ = req.reply.send(Reply::Failed(as_sorter_error(&e)));
                    return Err(e);
                }
            }
        }
        Ok(served)
    }
}

/// Physical inputs polled once per tick.
pub struct SensorInputs {
    cap: Box<dyn DigitalInput + Send>,
    ir: Box<dyn DigitalInput + Send>,
    button: Option<(Box<dyn DigitalInput + Send>, bool)>,
}

impl SensorInputs {
    pub fn new(
        cap: impl DigitalInput + Send + 'static,
        ir: impl DigitalInput + Send + 'static,
    ) -> Self {
        Self {
            cap: Box::new(cap),
            ir: Box::new(ir),
            button: None,
        }
    }

    /// Attach the manual trigger button; `active_high` is the pressed level.
    pub fn with_button(mut self, button: impl DigitalInput + Send + 'static, active_high: bool) -> Self {
        self.button = Some((Box::new(button), active_high));
        self
    }

    pub fn read(&mut self) -> Result<RawInputs> {
        let cap_high = read_level(self.cap.as_mut()).wrap_err("reading capacitive sensor")?;
        let ir_high = read_level(self.ir.as_mut()).wrap_err("reading IR sensor")?;
        Ok(RawInputs { cap_high, ir_high })
    }

    /// Whether the button is pressed, or `None` when no button is wired.
    pub fn button_pressed(&mut self) -> Result<Option<bool>> {
        match &mut self.button {
            None => Ok(None),
            Some((pin, active_high)) => {
                let high = read_level(pin.as_mut()).wrap_err("reading manual button")?;
                Ok(Some(high == *active_high))
            }
        }
    }
}

fn read_level(input: &mut (dyn DigitalInput + Send)) -> Result<bool> {
    input
        .is_high()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
}

/// Loop pacing and optional run limit.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub tick: Duration,
    /// Stop after this much clock time; `None` runs until shutdown.
    pub max_run: Option<Duration>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            max_run: None,
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub ticks: u64,
    pub auto_sorts: u64,
    pub button_sorts: u64,
    pub commands: u64,
    pub status: Status,
}

/// Drive `sorter` until `shutdown` is set, the run limit passes, or an I/O
/// fault occurs. Each tick: read inputs, serve queued requests, poll the
/// button, then let the automatic gate decide. Inputs are read again before
/// the gate when a request or the button was served.
pub fn run(
    sorter: &mut Sorter,
    inputs: &mut SensorInputs,
    queue: &CommandQueue,
    shutdown: &AtomicBool,
    params: RunParams,
) -> Result<RunSummary> {
    let clock = sorter.clock();
    let started = clock.now();
    let mut ticks = 0u64;
    let mut auto_sorts = 0u64;
    let mut button_sorts = 0u64;
    let mut commands = 0u64;

    tracing::info!(tick_ms = params.tick.as_millis() as u64, "control loop start");
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("control loop shutdown requested");
            break;
        }
        if let Some(limit) = params.max_run
            && clock.now().saturating_duration_since(started) >= limit
        {
            tracing::debug!(elapsed_ms = clock.ms_since(started), "control loop run limit reached");
            break;
        }

        let mut raw = inputs.read()?;
        sorter.observe(raw);
        let served = queue.drain(sorter)?;
        commands += served as u64;
        let mut stale = served > 0;
        if let Some(pressed) = inputs.button_pressed()?
            && sorter.press_button(pressed)?.is_some()
        {
            button_sorts += 1;
            stale = true;
        }
        // a served sort blocks for a whole flap cycle; the old reading is stale
        if stale {
            raw = inputs.read()?;
        }
        if sorter.tick(raw)?.is_some() {
            auto_sorts += 1;
        }
        ticks += 1;
        clock.sleep(params.tick);
    }

    let status = sorter.status();
    tracing::info!(
        ticks,
        auto_sorts,
        button_sorts,
        commands,
        mode = status.mode.as_str(),
        "control loop stopped"
    );
    Ok(RunSummary {
        ticks,
        auto_sorts,
        button_sorts,
        commands,
        status,
    })
}
