//! Fleet Service - reads telemetry and alerts as JSON lines on stdin and writes
//! proximity scans as JSON lines on stdout.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_service::events::{run_event_stream, EventClock};
use fleet_service::loops;
use fleet_service::{AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the scan stream.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleet_service=info".parse()?),
        )
        .init();

    tracing::info!("Starting Fleet Service...");

    let config = Config::from_env();
    let (state, shard_tasks) = AppState::new(config)?;
    let state = Arc::new(state);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let background = vec![
        tokio::spawn(loops::cleanup_loop::run_cleanup_loop(
            state.clone(),
            shutdown_tx.subscribe(),
        )),
        tokio::spawn(loops::hotspot_loop::run_hotspot_loop(
            state.clone(),
            shutdown_tx.subscribe(),
        )),
    ];

    let stream = run_event_stream(
        state.clone(),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        EventClock::WallClock,
    );

    tokio::select! {
        result = stream => {
            let summary = result?;
            tracing::info!(
                "Input closed: {} telemetry, {} alert(s), {} scan(s), {} rejected",
                summary.telemetry,
                summary.alerts,
                summary.scans,
                summary.rejected
            );
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    let _ = shutdown_tx.send(());
    for task in background {
        let _ = task.await;
    }

    if state.buffered_alert_count() > 0 {
        match state.refresh_hotspots().await {
            Ok(analysis) => tracing::info!(
                "Final hotspot pass: {} cluster(s), {} zone(s)",
                analysis.clusters.len(),
                state.risk_zones().len()
            ),
            Err(err) => tracing::warn!("Final hotspot pass failed: {}", err),
        }
    }

    // Dropping the last state handle closes the shard queues.
    drop(state);
    for task in shard_tasks {
        let _ = task.await;
    }

    tracing::info!("Fleet Service stopped");
    Ok(())
}
