//! Offline hotspot analysis for a batch of alerts.
//!
//! Prints one JSON report with the clusters, the risk zones derived from them
//! and, when a route is given, the route's exposure to those zones.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use fleet_cli::input::{load_alerts, load_route};
use fleet_core::{
    score_route_detailed, AnalyticsRules, ClusterParams, HotspotAnalysis, HotspotAnalyzer,
    RiskZone, RiskZoneGenerator, RouteRiskReport,
};

/// Cluster alerts into hotspots and derive risk zones
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file with an array of alert records
    #[arg(long)]
    alerts: PathBuf,

    /// Optional JSON file with route points to score against the zones
    #[arg(long)]
    route: Option<PathBuf>,

    /// Neighbourhood radius in kilometers
    #[arg(long, default_value_t = fleet_core::clustering::DEFAULT_EPSILON_KM)]
    epsilon_km: f64,

    /// Minimum neighbourhood size for a core point
    #[arg(long, default_value_t = fleet_core::clustering::DEFAULT_MIN_POINTS)]
    min_points: usize,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    analysis: HotspotAnalysis,
    risk_zones: Vec<RiskZone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_risk: Option<RouteRiskReport>,
}

fn main() -> Result<()> {
    fleet_cli::init_tracing("fleet_core=info")?;
    let args = Args::parse();

    let params = ClusterParams::new(args.epsilon_km, args.min_points)?;
    let rules = AnalyticsRules {
        cluster: params,
        ..AnalyticsRules::default()
    };

    let alerts = load_alerts(&args.alerts)?;
    tracing::info!("Loaded {} alert(s) from {}", alerts.len(), args.alerts.display());

    let analysis = HotspotAnalyzer::new(params)?.analyze(&alerts)?;
    let risk_zones = RiskZoneGenerator::from_rules(&rules).from_hotspots(&analysis);

    let route_risk = match &args.route {
        Some(path) => {
            let route = load_route(path)?;
            Some(score_route_detailed(&route, &risk_zones))
        }
        None => None,
    };

    let report = Report {
        analysis,
        risk_zones,
        route_risk,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
