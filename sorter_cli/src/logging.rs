//! Tracing subscriber setup: console layer plus optional JSON file sink.

use std::path::Path;

use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::FILE_GUARD;

/// Install the global subscriber. `RUST_LOG` wins over `cli_level`, which
/// wins over `[logging].level`.
pub fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    cfg: &sorter_config::Logging,
) -> eyre::Result<()> {
    let level = cli_level.or(cfg.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for command output
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file = match &cfg.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(
                Path::new(path),
                cfg.rotation.as_deref().unwrap_or("never"),
            )?);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

fn file_appender(
    path: &Path,
    rotation: &str,
) -> eyre::Result<tracing_appender::rolling::RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file {path:?} has no file name"))?;
    std::fs::create_dir_all(dir).wrap_err_with(|| format!("create log dir {dir:?}"))?;
    Ok(match rotation {
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    })
}
