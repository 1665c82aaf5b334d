//! Log sinks
//!
//! - `data_catalog_transfer.log` in the working directory, INFO and up, no ANSI
//! - stderr, errors only
//! - stdout, INFO and up, only with `--verbose`
//!
//! `RUST_LOG` replaces the INFO default of the file and stdout sinks.

use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

pub(crate) const LOG_FILE: &str = "data_catalog_transfer.log";

/// Flushes the file sink when dropped
pub(crate) struct LogGuard {
    _file: WorkerGuard,
}

/// Install the global subscriber
///
/// Fails if the log file cannot be created in the working directory.
pub(crate) fn init(verbose: bool) -> anyhow::Result<LogGuard> {
    let (writer, guard) = tracing_appender::non_blocking(file_appender(Path::new("."))?);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(info_unless_overridden())
            .boxed(),
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(LevelFilter::ERROR)
            .boxed(),
    ];
    if verbose {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(info_unless_overridden())
                .boxed(),
        );
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("installing log subscriber")?;
    Ok(LogGuard { _file: guard })
}

fn file_appender(dir: &Path) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)
        .with_context(|| format!("creating log file {LOG_FILE} in {}", dir.display()))
}

fn info_unless_overridden() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}
