//! Tracing setup: console plus a size-rotated log file.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use rollekatalog_sync_core::config::LoggingConfig;

use crate::rotating_file::RotatingFile;

/// HTTP stack crates that are far too chatty at debug.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Build the filter directive string for `level`.
fn filter_directives(level: &str) -> String {
    let mut directives = level.to_string();
    for target in QUIET_TARGETS {
        directives.push_str(&format!(",{}=info", target));
    }
    directives
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must live
/// until the process exits.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_new(filter_directives(&config.level))
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    let file = RotatingFile::open(&config.file, config.max_bytes, config.backups)
        .with_context(|| format!("failed to open log file {}", config.file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
