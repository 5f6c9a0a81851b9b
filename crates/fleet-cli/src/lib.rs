//! Fleet CLI - offline tools around the analytics core.
//!
//! - fleet-analyze: hotspot, risk-zone and route-risk report for an alert file
//! - fleet-replay: replay recorded telemetry through the sharded tracker

pub mod input;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stderr so stdout stays machine-readable.
pub fn init_tracing(directive: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();
    Ok(())
}
