//! Geospatial analytics core for fleet security monitoring.
//!
//! Incident hotspot clustering and risk scoring over alert batches, plus a
//! stateful proximity tracker that spots stationary vehicles and records who
//! is parked next to them.

pub mod clustering;
pub mod error;
pub mod hotspot;
pub mod models;
pub mod proximity;
pub mod risk;
pub mod route_risk;
pub mod route_segments;
pub mod rules;
pub mod spatial;
pub mod zones;

pub use clustering::{cluster_points, cluster_with_noise, ClusterOutcome, ClusterParams};
pub use error::{CoreError, Result};
pub use hotspot::{AlertCluster, HotspotAnalysis, HotspotAnalyzer};
pub use models::{
    AlertMetadata, AlertPoint, AlertRecord, AlertSeverity, Coordinate, RiskLevel, RiskZone,
    TelemetrySample,
};
pub use proximity::{
    retention_cutoff, CleanupReport, IngestOutcome, NearbyVehicle, ProximityScan,
    ProximityTracker, StationaryVehicle, TrackerConfig, TrackerStats, VehicleStatusEntry,
};
pub use risk::{assess_cluster, score_cluster};
pub use route_risk::{risk_factor, score_route, score_route_detailed, RouteRiskReport, ZoneExposure};
pub use route_segments::{compass_segments, vehicle_segments, RouteSegment};
pub use rules::AnalyticsRules;
pub use spatial::{destination_point, distance_meters, haversine_distance};
pub use zones::RiskZoneGenerator;
