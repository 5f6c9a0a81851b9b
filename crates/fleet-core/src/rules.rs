//! Tunable thresholds for hotspot analysis and risk-zone generation.

use serde::{Deserialize, Serialize};

use crate::clustering::ClusterParams;

/// Configuration for the analytics pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRules {
    /// Clustering radius and core-point threshold
    pub cluster: ClusterParams,
    /// Clusters with fewer alerts do not become risk zones
    pub min_zone_alerts: usize,
    /// Lower bound on a risk zone's radius in meters
    pub min_zone_radius_m: f64,
}

impl Default for AnalyticsRules {
    fn default() -> Self {
        Self {
            cluster: ClusterParams::default(),
            min_zone_alerts: 2,
            min_zone_radius_m: 500.0,
        }
    }
}
