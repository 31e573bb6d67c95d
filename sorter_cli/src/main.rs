#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `sorter` binary: config loading, logging, and command dispatch.

mod app;
mod cli;
mod error_fmt;
mod http;
mod hw;
mod logging;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use sorter_core::error::SorterError;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = sorter_config::load_file(&cli.config)
        .map_err(|e| eyre::Report::new(SorterError::Config(format!("{e:#}"))))?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "config loaded");

    match cli.cmd {
        Commands::Run {
            bind,
            no_http,
            auto,
            for_ms,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || {
                flag.store(true, Ordering::Relaxed);
            })
            .map_err(|e| eyre::eyre!("install Ctrl-C handler: {e}"))?;

            app::run_cmd(
                &cfg,
                app::RunOpts {
                    bind,
                    no_http,
                    auto,
                    for_ms,
                },
                shutdown,
                cli.json,
            )?;
        }
        Commands::Classify { cap, ir } => app::classify_cmd(&cfg, cap, ir, cli.json),
        Commands::Sort => {
            app::sort_once(&cfg, cli.json)?;
        }
        Commands::SelfCheck => app::self_check(&cfg)?,
    }
    Ok(())
}
