//! Side-channel diagnostics
//!
//! Failures inside the persistence layer are reported through `tracing`,
//! never through [`Logger`](super::Logger), so reporting them cannot feed back
//! into the buffer being persisted.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "logvault=info";

/// Install the global subscriber writing to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init_diagnostics(default_filter: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install diagnostics subscriber: {}", e))
}
