//! Risk-zone generation from hotspot clusters.

use crate::hotspot::{AlertCluster, HotspotAnalysis};
use crate::models::{RiskLevel, RiskZone};
use crate::rules::AnalyticsRules;

/// Maps significant clusters to risk zones ready for persistence.
#[derive(Debug, Clone)]
pub struct RiskZoneGenerator {
    min_alerts: usize,
    min_radius_m: f64,
}

impl Default for RiskZoneGenerator {
    fn default() -> Self {
        Self::from_rules(&AnalyticsRules::default())
    }
}

impl RiskZoneGenerator {
    pub fn from_rules(rules: &AnalyticsRules) -> Self {
        Self {
            min_alerts: rules.min_zone_alerts,
            min_radius_m: rules.min_zone_radius_m,
        }
    }

    /// Build zones for every cluster with enough alerts, in input order.
    ///
    /// Zone ids are left unset; the persistence layer assigns them.
    pub fn from_hotspots(&self, analysis: &HotspotAnalysis) -> Vec<RiskZone> {
        analysis
            .clusters
            .iter()
            .filter(|cluster| cluster.alert_count >= self.min_alerts)
            .enumerate()
            .map(|(idx, cluster)| self.zone_for(idx + 1, cluster))
            .collect()
    }

    fn zone_for(&self, ordinal: usize, cluster: &AlertCluster) -> RiskZone {
        let radius_meters = (cluster.radius_km * 1000.0).max(self.min_radius_m);
        RiskZone {
            id: None,
            name: format!("{} risk hotspot #{}", level_title(cluster.severity), ordinal),
            centroid: cluster.centroid,
            radius_meters,
            risk_level: cluster.severity,
            description: format!(
                "{} incidents clustered within {:.0} m (risk score {}). \
                 Most recent incident on {}.",
                cluster.alert_count,
                radius_meters,
                cluster.risk_score,
                cluster.last_incident.format("%Y-%m-%d")
            ),
        }
    }
}

fn level_title(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Low",
        RiskLevel::Medium => "Medium",
        RiskLevel::High => "High",
        RiskLevel::Critical => "Critical",
    }
}
