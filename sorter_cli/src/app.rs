//! Command implementations: config mapping, engine assembly, and the run loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use sorter_config::Config;
use sorter_core::error::Result as CoreResult;
use sorter_core::{
    ControlSurface, Counters, Mode, Outcome, RawInputs, RunParams, RunSummary, SensorPolarity,
    Sorter, classify, command_queue, decide, run,
};
use sorter_traits::Servo;

use crate::hw::{self, Hardware};

/// Build the engine from config; both flaps are parked on success.
pub fn build_sorter(
    cfg: &Config,
    plastic: Box<dyn Servo + Send>,
    paper: Box<dyn Servo + Send>,
) -> CoreResult<Sorter> {
    Sorter::builder()
        .with_plastic_servo(plastic)
        .with_paper_servo(paper)
        .with_plastic_flap((&cfg.flaps.plastic).into())
        .with_paper_flap((&cfg.flaps.paper).into())
        .with_polarity((&cfg.sensors).into())
        .with_motion((&cfg.motion).into())
        .with_arming((&cfg.auto).into())
        .build()
}

fn counters_line(c: &Counters) -> String {
    format!(
        "biodegradable={} non_biodegradable={}",
        c.biodegradable, c.non_biodegradable
    )
}

pub fn classify_cmd(cfg: &Config, cap: u8, ir: u8, json: bool) {
    let polarity = SensorPolarity::from(&cfg.sensors);
    let det = classify(RawInputs::new(cap == 1, ir == 1), &polarity);
    let outcome = decide(det);
    if json {
        println!(
            "{}",
            serde_json::json!({
                "cap_detected": det.cap_detected,
                "ir_detected": det.ir_detected,
                "outcome": outcome.as_str(),
                "category": outcome.category().map(|c| c.as_str()),
            })
        );
    } else {
        println!(
            "cap_detected={} ir_detected={} outcome={outcome}",
            det.cap_detected, det.ir_detected
        );
    }
}

pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let Hardware { plastic, paper, .. } = hw::open(cfg)?;
    let sorter = build_sorter(cfg, plastic, paper)?;
    tracing::info!(?sorter, "self-check passed");
    println!("ok");
    Ok(())
}

pub fn sort_once(cfg: &Config, json: bool) -> eyre::Result<Outcome> {
    let Hardware {
        plastic,
        paper,
        mut inputs,
    } = hw::open(cfg)?;
    let mut sorter = build_sorter(cfg, plastic, paper)?;
    let raw = inputs.read()?;
    let outcome = sorter.trigger_manual_sort(raw)?;
    let counters = sorter.counters();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "outcome": outcome.as_str(),
                "biodegradable": counters.biodegradable,
                "non_biodegradable": counters.non_biodegradable,
            })
        );
    } else {
        println!("outcome={outcome} {}", counters_line(&counters));
    }
    Ok(outcome)
}

pub struct RunOpts {
    pub bind: Option<SocketAddr>,
    pub no_http: bool,
    pub auto: bool,
    pub for_ms: Option<u64>,
}

/// Run the control loop on its own thread, with the HTTP surface on a tokio
/// runtime when a bind address is known. Returns when `shutdown` is set, the
/// run limit passes, or the loop hits a fault.
pub fn run_cmd(
    cfg: &Config,
    opts: RunOpts,
    shutdown: Arc<AtomicBool>,
    json: bool,
) -> eyre::Result<RunSummary> {
    let Hardware {
        plastic,
        paper,
        mut inputs,
    } = hw::open(cfg)?;
    let mut sorter = build_sorter(cfg, plastic, paper)?;

    let params = RunParams {
        tick: Duration::from_millis(cfg.control.tick_ms),
        max_run: opts.for_ms.map(Duration::from_millis),
    };
    let bind = match opts.bind {
        Some(addr) => Some(addr),
        None => cfg.server.bind_addr()?,
    }
    .filter(|_| !opts.no_http);

    let (handle, queue) = command_queue();
    let loop_done = Arc::new(AtomicBool::new(false));
    let worker = {
        let shutdown = shutdown.clone();
        let loop_done = loop_done.clone();
        std::thread::Builder::new()
            .name("sorter-loop".into())
            .spawn(move || {
                let res = run(&mut sorter, &mut inputs, &queue, &shutdown, params);
                if let Err(e) = &res {
                    tracing::error!(error = %format!("{e:#}"), "control loop aborted");
                }
                loop_done.store(true, Ordering::Relaxed);
                res
            })
            .wrap_err("spawn control loop thread")?
    };

    if opts.auto
        && let Err(e) = handle.set_mode(Mode::Automatic)
    {
        tracing::warn!(error = %format!("{e:#}"), "could not enter automatic mode");
    }

    let served = match bind {
        Some(addr) => serve_http(addr, Arc::new(handle), &shutdown, &loop_done),
        None => Ok(()),
    };
    if served.is_err() {
        shutdown.store(true, Ordering::Relaxed);
    }

    let summary = worker
        .join()
        .map_err(|_| eyre::eyre!("control loop thread panicked"))??;
    served?;

    if json {
        let mut v = crate::http::status_value(&summary.status);
        v["ticks"] = summary.ticks.into();
        v["auto_sorts"] = summary.auto_sorts.into();
        v["button_sorts"] = summary.button_sorts.into();
        println!("{v}");
    } else {
        println!(
            "mode={} {} ticks={} auto_sorts={} button_sorts={}",
            summary.status.mode,
            counters_line(&summary.status.counters),
            summary.ticks,
            summary.auto_sorts,
            summary.button_sorts
        );
    }
    Ok(summary)
}

fn serve_http(
    addr: SocketAddr,
    surface: Arc<dyn ControlSurface>,
    shutdown: &Arc<AtomicBool>,
    loop_done: &Arc<AtomicBool>,
) -> eyre::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("start tokio runtime")?;
    let shutdown = shutdown.clone();
    let loop_done = loop_done.clone();
    rt.block_on(crate::http::serve(addr, surface, async move {
        while !shutdown.load(Ordering::Relaxed) && !loop_done.load(Ordering::Relaxed) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }))
}
