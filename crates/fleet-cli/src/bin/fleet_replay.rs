//! Replay recorded telemetry and alerts through the sharded tracker.
//!
//! Input is the same line-delimited event stream the service reads. Scans are
//! written to stdout as they occur, followed by a single summary line. By
//! default samples are evaluated against the wall clock like the live service;
//! `--sample-time` evaluates each sample as of its own timestamp instead, and
//! the summary's stationary vehicles as of the newest replayed sample.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tokio::fs::File;
use tokio::io::BufReader;

use fleet_core::{HotspotAnalysis, RiskZone, StationaryVehicle};
use fleet_service::events::{run_event_stream, EventClock, StreamSummary};
use fleet_service::state::ServiceStats;
use fleet_service::{AppState, Config};

/// Replay an NDJSON event log through the proximity tracker
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// File of `telemetry` / `alert` events, one JSON object per line
    #[arg(long)]
    telemetry: PathBuf,

    /// Number of tracker shards (defaults to FLEET_TRACKER_SHARDS or 4)
    #[arg(long)]
    shards: Option<usize>,

    /// Proximity scan radius in meters
    #[arg(long)]
    radius_m: Option<f64>,

    /// Evaluate each sample as of its own timestamp instead of arrival time
    #[arg(long)]
    sample_time: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaySummary {
    kind: &'static str,
    stream: StreamSummary,
    stats: ServiceStats,
    stationary_vehicles: Vec<StationaryVehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hotspots: Option<HotspotAnalysis>,
    risk_zones: Vec<RiskZone>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fleet_cli::init_tracing("fleet_service=info")?;
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(shards) = args.shards {
        config.tracker_shards = shards.max(1);
    }
    if let Some(radius_m) = args.radius_m {
        config.tracker.proximity_radius_m = radius_m;
    }

    let (state, _shard_tasks) = AppState::new(config)?;
    let state = Arc::new(state);

    let clock = if args.sample_time {
        EventClock::SampleTime
    } else {
        EventClock::WallClock
    };

    let file = File::open(&args.telemetry).await?;
    let stream = run_event_stream(
        state.clone(),
        BufReader::new(file),
        tokio::io::stdout(),
        clock,
    )
    .await?;
    tracing::info!(
        "Replayed {} telemetry, {} alert(s): {} scan(s), {} rejected",
        stream.telemetry,
        stream.alerts,
        stream.scans,
        stream.rejected
    );

    let hotspots = if state.buffered_alert_count() > 0 {
        Some(state.refresh_hotspots().await?)
    } else {
        None
    };

    let stationary_vehicles = match (clock, stream.latest_timestamp) {
        (EventClock::SampleTime, Some(as_of)) => state.stationary_vehicles_at(as_of).await?,
        (EventClock::SampleTime, None) => Vec::new(),
        (EventClock::WallClock, _) => state.stationary_vehicles().await?,
    };

    let summary = ReplaySummary {
        kind: "summary",
        stream,
        stats: state.stats().await?,
        stationary_vehicles,
        hotspots,
        risk_zones: state.risk_zones(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
