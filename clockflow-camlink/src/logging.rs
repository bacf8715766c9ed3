//! Tracing setup for the command line tool.

use clap::ValueEnum;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Log output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One line per event.
    #[default]
    Compact,
    /// Multi-line, human oriented.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs the global subscriber. The filter is taken from `RUST_LOG`, or `default_filter` if unset.
///
/// Does nothing if a subscriber is already installed.
pub fn init(format: LogFormat, default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let layer = match format {
        LogFormat::Compact => fmt::layer().compact().with_target(false).with_filter(filter).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_filter(filter).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(false).with_filter(filter).boxed(),
    };
    // Tests and embedding applications may have installed their own.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
