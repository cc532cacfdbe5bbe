use anyhow::{Context, Result};
use clap::ValueEnum;
use log::LevelFilter;

/// Logging verbosity selectable on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Errors and skipped lookups
    Warn,
    /// Adds enrichment and export summaries
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Install the global logger writing to stderr.
///
/// `RUST_LOG` is read first, then `level` replaces its default level.
pub fn init_logger(level: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.format_timestamp(None);
    builder.format_target(false);
    builder.try_init().context("failed to initialize logger")
}
