//! Incident hotspot analysis.
//!
//! Turns a batch of alerts into scored clusters: locate, cluster, then
//! summarize each cluster with a centroid, radius, risk score and the time of
//! its latest incident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clustering::{cluster_points, ClusterParams};
use crate::error::Result;
use crate::models::{AlertPoint, AlertRecord, Coordinate, RiskLevel};
use crate::risk::assess_cluster;
use crate::spatial::{centroid, distance_km};

/// Summary of one incident cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCluster {
    pub centroid: Coordinate,
    pub radius_km: f64,
    pub alert_count: usize,
    pub alert_ids: Vec<i64>,
    pub risk_score: u8,
    pub severity: RiskLevel,
    pub last_incident: DateTime<Utc>,
}

/// Result of one analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotAnalysis {
    pub clusters: Vec<AlertCluster>,
    pub analysis_timestamp: DateTime<Utc>,
    pub total_alerts_analyzed: usize,
    pub high_risk_clusters: usize,
}

/// Clusters alerts and scores the resulting hotspots.
#[derive(Debug, Clone, Default)]
pub struct HotspotAnalyzer {
    params: ClusterParams,
}

impl HotspotAnalyzer {
    pub fn new(params: ClusterParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// Analyze `alerts` using the current wall-clock time for recency scoring.
    pub fn analyze(&self, alerts: &[AlertRecord]) -> Result<HotspotAnalysis> {
        self.analyze_at(alerts, Utc::now())
    }

    /// Analyze `alerts` as of `now`.
    ///
    /// Alerts without a usable location (missing or exactly `(0, 0)`) are counted in
    /// `total_alerts_analyzed` but never clustered.
    pub fn analyze_at(
        &self,
        alerts: &[AlertRecord],
        now: DateTime<Utc>,
    ) -> Result<HotspotAnalysis> {
        let mut points = Vec::with_capacity(alerts.len());
        for record in alerts {
            if let Some(point) = AlertPoint::try_from_record(record)? {
                points.push(point);
            }
        }

        let analysis = self.analyze_points(&points, alerts.len(), now);
        tracing::debug!(
            "Hotspot analysis: {} alerts, {} located, {} clusters ({} high risk)",
            alerts.len(),
            points.len(),
            analysis.clusters.len(),
            analysis.high_risk_clusters
        );
        Ok(analysis)
    }

    /// Analyze already-located points. `total_alerts` is reported as-is.
    pub fn analyze_points(
        &self,
        points: &[AlertPoint],
        total_alerts: usize,
        now: DateTime<Utc>,
    ) -> HotspotAnalysis {
        let coordinates: Vec<Coordinate> = points.iter().map(AlertPoint::coordinate).collect();

        let clusters: Vec<AlertCluster> = cluster_points(&coordinates, &self.params)
            .into_iter()
            .filter_map(|indices| {
                let members: Vec<&AlertPoint> = indices.iter().map(|&i| &points[i]).collect();
                summarize_cluster(&members, now)
            })
            .collect();

        let high_risk_clusters = clusters
            .iter()
            .filter(|cluster| cluster.severity.is_high_risk())
            .count();

        HotspotAnalysis {
            clusters,
            analysis_timestamp: now,
            total_alerts_analyzed: total_alerts,
            high_risk_clusters,
        }
    }
}

fn summarize_cluster(members: &[&AlertPoint], now: DateTime<Utc>) -> Option<AlertCluster> {
    let coordinates: Vec<Coordinate> = members.iter().map(|p| p.coordinate()).collect();
    let center = centroid(&coordinates)?;
    let last_incident = members.iter().map(|p| p.timestamp).max()?;

    let radius_km = coordinates
        .iter()
        .map(|c| distance_km(&center, c))
        .fold(0.0, f64::max);

    let (risk_score, severity) = assess_cluster(members.iter().copied(), now);

    Some(AlertCluster {
        centroid: center,
        radius_km,
        alert_count: members.len(),
        alert_ids: members.iter().map(|p| p.id).collect(),
        risk_score,
        severity,
        last_incident,
    })
}
