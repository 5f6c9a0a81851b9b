//! In-memory state store using DashMap.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;

use fleet_core::{
    retention_cutoff, score_route_detailed, AlertRecord, CleanupReport, Coordinate, HotspotAnalysis,
    HotspotAnalyzer, IngestOutcome, NearbyVehicle, ProximityScan, RiskZone, RiskZoneGenerator,
    RouteRiskReport, RouteSegment, StationaryVehicle, TelemetrySample, TrackerStats,
};

use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use crate::tracking::ShardedTracker;

/// Point-in-time counters for the whole service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub tracker: TrackerStats,
    pub known_positions: usize,
    pub buffered_alerts: usize,
    pub risk_zones: usize,
}

/// Application state shared by the ingest path and the background loops.
pub struct AppState {
    config: Config,
    /// Latest sample per vehicle; the snapshot handed to proximity scans
    positions: DashMap<String, TelemetrySample>,
    tracker: ShardedTracker,
    alerts: Mutex<VecDeque<AlertRecord>>,
    hotspots: RwLock<Option<HotspotAnalysis>>,
    risk_zones: RwLock<Vec<RiskZone>>,
    analyzer: HotspotAnalyzer,
    zone_generator: RiskZoneGenerator,
    loop_heartbeats: DashMap<String, DateTime<Utc>>,
}

impl AppState {
    /// Build the state and start the tracker shards on the current runtime.
    pub fn new(config: Config) -> ServiceResult<(Self, Vec<JoinHandle<()>>)> {
        let analyzer = HotspotAnalyzer::new(config.rules.cluster)?;
        let zone_generator = RiskZoneGenerator::from_rules(&config.rules);
        let (tracker, shard_tasks) = ShardedTracker::spawn(
            config.tracker_shards,
            config.shard_channel_capacity,
            config.tracker.clone(),
        );

        let state = Self {
            config,
            positions: DashMap::new(),
            tracker,
            alerts: Mutex::new(VecDeque::new()),
            hotspots: RwLock::new(None),
            risk_zones: RwLock::new(Vec::new()),
            analyzer,
            zone_generator,
            loop_heartbeats: DashMap::new(),
        };
        Ok((state, shard_tasks))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Record a position report and run the owning shard's proximity logic.
    pub async fn ingest_telemetry(&self, sample: TelemetrySample) -> ServiceResult<IngestOutcome> {
        self.ingest_telemetry_at(sample, Utc::now()).await
    }

    pub async fn ingest_telemetry_at(
        &self,
        sample: TelemetrySample,
        now: DateTime<Utc>,
    ) -> ServiceResult<IngestOutcome> {
        sample.validate()?;

        self.positions
            .insert(sample.vehicle_id.clone(), sample.clone());
        let snapshot: Vec<TelemetrySample> =
            self.positions.iter().map(|r| r.value().clone()).collect();

        self.tracker.ingest_at(sample, snapshot, now).await
    }

    pub fn latest_position(&self, vehicle_id: &str) -> Option<TelemetrySample> {
        self.positions.get(vehicle_id).map(|r| r.value().clone())
    }

    /// Buffer an alert for the next hotspot pass, evicting the oldest past the limit.
    pub fn record_alert(&self, alert: AlertRecord) {
        self.record_alerts(std::iter::once(alert));
    }

    pub fn record_alerts(&self, alerts: impl IntoIterator<Item = AlertRecord>) {
        let limit = self.config.alert_buffer_limit;
        let mut buffer = self.alert_buffer();
        buffer.extend(alerts);

        let overflow = buffer.len().saturating_sub(limit);
        if overflow > 0 {
            buffer.drain(..overflow);
            tracing::warn!("Alert buffer full, discarded {} oldest alert(s)", overflow);
        }
    }

    pub fn buffered_alert_count(&self) -> usize {
        self.alert_buffer().len()
    }

    /// Re-run hotspot analysis over the buffered alerts and replace the risk zones.
    pub async fn refresh_hotspots(&self) -> ServiceResult<HotspotAnalysis> {
        self.refresh_hotspots_at(Utc::now()).await
    }

    pub async fn refresh_hotspots_at(&self, now: DateTime<Utc>) -> ServiceResult<HotspotAnalysis> {
        let alerts: Vec<AlertRecord> = self.alert_buffer().iter().cloned().collect();
        let analyzer = self.analyzer.clone();
        let zone_generator = self.zone_generator.clone();

        // Clustering is quadratic in the number of located alerts.
        let (analysis, zones) = tokio::task::spawn_blocking(move || {
            analyzer.analyze_at(&alerts, now).map(|analysis| {
                let zones = zone_generator.from_hotspots(&analysis);
                (analysis, zones)
            })
        })
        .await
        .map_err(|e| ServiceError::Analysis(e.to_string()))??;

        tracing::info!(
            "Hotspot analysis: {} alert(s), {} cluster(s), {} high risk, {} zone(s)",
            analysis.total_alerts_analyzed,
            analysis.clusters.len(),
            analysis.high_risk_clusters,
            zones.len()
        );

        if let Ok(mut slot) = self.risk_zones.write() {
            *slot = zones;
        }
        if let Ok(mut slot) = self.hotspots.write() {
            *slot = Some(analysis.clone());
        }
        Ok(analysis)
    }

    /// Latest hotspot analysis, if one has completed.
    pub fn hotspots(&self) -> Option<HotspotAnalysis> {
        self.hotspots.read().ok().and_then(|slot| slot.clone())
    }

    pub fn risk_zones(&self) -> Vec<RiskZone> {
        self.risk_zones
            .read()
            .map(|zones| zones.clone())
            .unwrap_or_default()
    }

    /// Score a planned route against the current risk zones.
    pub fn route_risk(&self, route: &[Coordinate]) -> RouteRiskReport {
        let zones = self.risk_zones();
        score_route_detailed(route, &zones)
    }

    pub async fn nearby_vehicles(
        &self,
        vehicle_id: &str,
        radius_m: f64,
    ) -> ServiceResult<Vec<NearbyVehicle>> {
        self.tracker.nearby_vehicles(vehicle_id, radius_m).await
    }

    pub async fn scan_history(
        &self,
        vehicle_id: &str,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<ProximityScan>> {
        self.tracker.scan_history(vehicle_id, limit).await
    }

    pub async fn vehicle_segments(
        &self,
        vehicle_id: &str,
        max_distance_m: f64,
    ) -> ServiceResult<Vec<RouteSegment>> {
        self.tracker.segments(vehicle_id, max_distance_m).await
    }

    pub async fn stationary_vehicles(&self) -> ServiceResult<Vec<StationaryVehicle>> {
        self.tracker.stationary_vehicles().await
    }

    pub async fn stationary_vehicles_at(
        &self,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<StationaryVehicle>> {
        self.tracker.stationary_vehicles_at(now).await
    }

    /// Drop history older than the configured retention window.
    pub async fn cleanup(&self) -> ServiceResult<CleanupReport> {
        self.cleanup_at(self.config.retention_hours, Utc::now()).await
    }

    pub async fn cleanup_at(
        &self,
        max_age_hours: f64,
        now: DateTime<Utc>,
    ) -> ServiceResult<CleanupReport> {
        let report = self.tracker.cleanup_at(max_age_hours, now).await?;

        let before = self.positions.len();
        if let Some(cutoff) = retention_cutoff(now, max_age_hours) {
            self.positions.retain(|_, sample| sample.timestamp > cutoff);
        }
        let removed_positions = before.saturating_sub(self.positions.len());

        tracing::debug!(
            "Cleanup removed {} status entr(ies), {} scan(s), {} vehicle(s), {} stale position(s)",
            report.removed_status_entries,
            report.removed_scans,
            report.removed_vehicles,
            removed_positions
        );
        Ok(report)
    }

    pub async fn stats(&self) -> ServiceResult<ServiceStats> {
        Ok(ServiceStats {
            tracker: self.tracker.stats().await?,
            known_positions: self.positions.len(),
            buffered_alerts: self.buffered_alert_count(),
            risk_zones: self.risk_zones().len(),
        })
    }

    pub fn mark_loop_heartbeat(&self, name: &str) {
        self.loop_heartbeats.insert(name.to_string(), Utc::now());
    }

    pub fn loop_heartbeat(&self, name: &str) -> Option<DateTime<Utc>> {
        self.loop_heartbeats.get(name).map(|r| *r.value())
    }

    fn alert_buffer(&self) -> MutexGuard<'_, VecDeque<AlertRecord>> {
        // A panic while holding the lock cannot leave the queue half-written.
        self.alerts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
