use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LoggingSettings, default_log_dir};

const DAYS_TO_KEEP: usize = 7;

/// Directory the log files go to: configured, XDG state dir, or the temp dir.
pub fn log_dir(settings: &LoggingSettings) -> PathBuf {
    settings
        .dir
        .clone()
        .or_else(default_log_dir)
        .unwrap_or_else(|| std::env::temp_dir().join("cadenza"))
}

/// Filter from `RUST_LOG` if set, otherwise from the configured level.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing with a daily rolling log file.
///
/// The terminal belongs to the UI, so nothing is written to stdout/stderr.
/// Keep the returned guard alive until exit or buffered lines are lost.
///
/// # Errors
/// Returns error if the log directory can't be created or a global
/// subscriber is already installed.
pub fn init(settings: &LoggingSettings) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let dir = log_dir(settings);
    std::fs::create_dir_all(&dir)?;

    let file_appender = Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("cadenza")
        .filename_suffix("log")
        .build(&dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(settings))
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_level(true)
                .with_thread_names(true)
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}
