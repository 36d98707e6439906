use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn log_file_name() -> String {
    format!(
        "execution-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    )
}

/// One log file per run. `RUST_LOG` wins over the configured level.
/// Keep the guard alive until exit so buffered lines are flushed.
pub fn init(log_dir: &Path, level: &str) -> Result<(WorkerGuard, PathBuf)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("could not create log directory: {}", log_dir.display()))?;

    let file_name = log_file_name();
    let path = log_dir.join(&file_name);
    let appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level: {level}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("logging was already initialized")?;

    Ok((guard, path))
}
