//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sorter", version, about = "Waste sorter CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/sorter_config.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop and, unless disabled, the HTTP control surface
    Run {
        /// HTTP bind address (overrides [server].bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
        /// Do not start the HTTP control surface
        #[arg(long, action = ArgAction::SetTrue)]
        no_http: bool,
        /// Switch to Automatic mode right after start
        #[arg(long, action = ArgAction::SetTrue)]
        auto: bool,
        /// Stop after this many milliseconds and print a final report
        #[arg(long, value_name = "MS")]
        for_ms: Option<u64>,
    },
    /// Show how raw sensor levels are interpreted (no actuation)
    Classify {
        /// Raw capacitive sensor level
        #[arg(long, value_name = "0|1", value_parser = clap::value_parser!(u8).range(0..=1))]
        cap: u8,
        /// Raw IR sensor level
        #[arg(long, value_name = "0|1", value_parser = clap::value_parser!(u8).range(0..=1))]
        ir: u8,
    },
    /// Read the sensors once and sort whatever is in front of them
    Sort,
    /// Quick health check (config, hardware presence / sim ok)
    SelfCheck,
}
