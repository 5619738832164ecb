//! Logging setup

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "jobrun=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, for development
    Pretty,
    /// Structured JSON, for log shippers
    Json,
}

/// Install the global subscriber. Logs go to stderr so stdout only carries
/// job results.
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives (default: `jobrun=info`)
pub fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow!("Failed to create env filter: {}", e))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}
