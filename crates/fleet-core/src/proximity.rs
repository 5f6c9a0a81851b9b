//! Stationary-vehicle detection and proximity scanning.
//!
//! The tracker owns every vehicle's status and scan history. Nothing expires on
//! its own: callers must run [`ProximityTracker::cleanup`] periodically to bound
//! memory.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, Result};
use crate::models::{Coordinate, TelemetrySample};

/// Thresholds for movement and stationarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Seconds without movement before a vehicle counts as stationary
    pub stationary_threshold_secs: f64,
    /// Radius of a proximity scan in meters
    pub proximity_radius_m: f64,
    /// Reported speed above which a vehicle is moving
    pub movement_speed_threshold_kmh: f64,
    /// Displacement between samples above which a vehicle is moving
    pub movement_displacement_threshold_m: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            stationary_threshold_secs: 60.0,
            proximity_radius_m: 100.0,
            movement_speed_threshold_kmh: 3.0,
            movement_displacement_threshold_m: 5.0,
        }
    }
}

/// One entry in a vehicle's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatusEntry {
    pub timestamp: DateTime<Utc>,
    pub coordinate: Coordinate,
    pub is_moving: bool,
}

/// A vehicle found near a stationary vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyVehicle {
    pub id: String,
    pub distance_meters: f64,
    pub coordinate: Coordinate,
    pub detected_at: DateTime<Utc>,
}

/// Result of scanning around a stationary vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityScan {
    pub center_vehicle_id: String,
    pub center_coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
    pub nearby_vehicles: Vec<NearbyVehicle>,
    pub is_stationary: bool,
    pub stationary_duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationaryVehicle {
    pub vehicle_id: String,
    pub coordinate: Coordinate,
    pub stationary_since: DateTime<Utc>,
    pub stationary_duration_seconds: f64,
}

/// What a single [`ProximityTracker::ingest`] call observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub is_moving: bool,
    /// Present only when the vehicle is not moving
    pub stationary_duration_seconds: Option<f64>,
    /// Present only when the stationary threshold was reached
    pub scan: Option<ProximityScan>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStats {
    pub tracked_vehicles: usize,
    pub status_entries: usize,
    pub scan_records: usize,
}

impl TrackerStats {
    pub fn merge(self, other: TrackerStats) -> TrackerStats {
        TrackerStats {
            tracked_vehicles: self.tracked_vehicles + other.tracked_vehicles,
            status_entries: self.status_entries + other.status_entries,
            scan_records: self.scan_records + other.scan_records,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub removed_status_entries: usize,
    pub removed_scans: usize,
    pub removed_vehicles: usize,
}

impl CleanupReport {
    pub fn merge(self, other: CleanupReport) -> CleanupReport {
        CleanupReport {
            removed_status_entries: self.removed_status_entries + other.removed_status_entries,
            removed_scans: self.removed_scans + other.removed_scans,
            removed_vehicles: self.removed_vehicles + other.removed_vehicles,
        }
    }
}

#[derive(Debug, Default)]
struct VehicleTrack {
    status_history: Vec<VehicleStatusEntry>,
    scan_history: Vec<ProximityScan>,
}

impl VehicleTrack {
    fn is_empty(&self) -> bool {
        self.status_history.is_empty() && self.scan_history.is_empty()
    }

    /// Start of the current stationary stretch: the latest moving entry, or the
    /// first entry when the vehicle has never been seen moving.
    fn stationary_since(&self) -> Option<DateTime<Utc>> {
        self.status_history
            .iter()
            .rev()
            .find(|entry| entry.is_moving)
            .or_else(|| self.status_history.first())
            .map(|entry| entry.timestamp)
    }
}

/// Cutoff for a retention window of `max_age_hours` ending at `now`.
///
/// Entries stamped at or before the cutoff are expired. Negative or NaN
/// retention counts as zero. `None` when the window reaches past the earliest
/// representable time, meaning nothing is old enough to expire.
pub fn retention_cutoff(now: DateTime<Utc>, max_age_hours: f64) -> Option<DateTime<Utc>> {
    let max_age_ms = max_age_hours.max(0.0) * 3_600_000.0;
    if max_age_ms >= i64::MAX as f64 {
        return None;
    }
    let window = Duration::try_milliseconds(max_age_ms as i64)?;
    now.checked_sub_signed(window)
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Per-vehicle movement history and stationary proximity scanning.
#[derive(Debug, Default)]
pub struct ProximityTracker {
    config: TrackerConfig,
    vehicles: HashMap<String, VehicleTrack>,
}

impl ProximityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            vehicles: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Record `sample` and, if the vehicle has been stationary long enough, scan
    /// `all_current` (latest positions of every known vehicle) for neighbours.
    pub fn ingest(
        &mut self,
        sample: &TelemetrySample,
        all_current: &[TelemetrySample],
    ) -> IngestOutcome {
        self.ingest_at(sample, all_current, Utc::now())
    }

    pub fn ingest_at(
        &mut self,
        sample: &TelemetrySample,
        all_current: &[TelemetrySample],
        now: DateTime<Utc>,
    ) -> IngestOutcome {
        let coordinate = sample.coordinate();
        let track = self.vehicles.entry(sample.vehicle_id.clone()).or_default();

        let is_moving = is_moving(&self.config, sample, track.status_history.last());
        track.status_history.push(VehicleStatusEntry {
            timestamp: sample.timestamp,
            coordinate,
            is_moving,
        });

        if is_moving {
            return IngestOutcome {
                is_moving,
                stationary_duration_seconds: None,
                scan: None,
            };
        }

        let stationary_duration = track
            .stationary_since()
            .map(|since| seconds_between(since, now))
            .unwrap_or(0.0);

        if stationary_duration < self.config.stationary_threshold_secs {
            return IngestOutcome {
                is_moving,
                stationary_duration_seconds: Some(stationary_duration),
                scan: None,
            };
        }

        let scan = ProximityScan {
            center_vehicle_id: sample.vehicle_id.clone(),
            center_coordinate: coordinate,
            timestamp: now,
            nearby_vehicles: find_nearby(
                &sample.vehicle_id,
                &coordinate,
                all_current,
                self.config.proximity_radius_m,
                now,
            ),
            is_stationary: true,
            stationary_duration_seconds: stationary_duration,
        };
        tracing::debug!(
            "Proximity scan for {}: stationary {:.0}s, {} vehicle(s) within {}m",
            scan.center_vehicle_id,
            stationary_duration,
            scan.nearby_vehicles.len(),
            self.config.proximity_radius_m
        );
        track.scan_history.push(scan.clone());

        IngestOutcome {
            is_moving,
            stationary_duration_seconds: Some(stationary_duration),
            scan: Some(scan),
        }
    }

    /// Vehicles from the latest scan of `vehicle_id` within `radius_m`.
    ///
    /// The result can never extend past the radius the scan was taken with.
    pub fn nearby_vehicles(&self, vehicle_id: &str, radius_m: f64) -> Vec<NearbyVehicle> {
        self.latest_scan(vehicle_id)
            .map(|scan| {
                scan.nearby_vehicles
                    .iter()
                    .filter(|nearby| nearby.distance_meters <= radius_m)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn latest_scan(&self, vehicle_id: &str) -> Option<&ProximityScan> {
        self.vehicles
            .get(vehicle_id)
            .and_then(|track| track.scan_history.last())
    }

    /// Up to `limit` most recent scans for a vehicle, oldest first.
    pub fn scan_history(&self, vehicle_id: &str, limit: Option<usize>) -> Vec<ProximityScan> {
        let Some(track) = self.vehicles.get(vehicle_id) else {
            return Vec::new();
        };
        let history = &track.scan_history;
        let skip = limit.map_or(0, |limit| history.len().saturating_sub(limit));
        history[skip..].to_vec()
    }

    pub fn status_history(&self, vehicle_id: &str) -> &[VehicleStatusEntry] {
        self.vehicles
            .get(vehicle_id)
            .map(|track| track.status_history.as_slice())
            .unwrap_or(&[])
    }

    pub fn latest_coordinate(&self, vehicle_id: &str) -> Option<Coordinate> {
        self.vehicles
            .get(vehicle_id)
            .and_then(|track| track.status_history.last())
            .map(|entry| entry.coordinate)
    }

    /// Vehicles whose latest status is stationary for longer than the threshold.
    pub fn stationary_vehicles(&self) -> Vec<StationaryVehicle> {
        self.stationary_vehicles_at(Utc::now())
    }

    pub fn stationary_vehicles_at(&self, now: DateTime<Utc>) -> Vec<StationaryVehicle> {
        let mut stationary: Vec<StationaryVehicle> = self
            .vehicles
            .iter()
            .filter_map(|(vehicle_id, track)| {
                let latest = track.status_history.last()?;
                if latest.is_moving {
                    return None;
                }
                let since = track.stationary_since()?;
                let duration = seconds_between(since, now);
                (duration > self.config.stationary_threshold_secs).then(|| StationaryVehicle {
                    vehicle_id: vehicle_id.clone(),
                    coordinate: latest.coordinate,
                    stationary_since: since,
                    stationary_duration_seconds: duration,
                })
            })
            .collect();
        stationary.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        stationary
    }

    /// Drop history older than `max_age_hours` and forget vehicles left empty.
    ///
    /// A zero retention clears everything recorded up to now.
    pub fn cleanup(&mut self, max_age_hours: f64) -> CleanupReport {
        self.cleanup_at(max_age_hours, Utc::now())
    }

    pub fn cleanup_at(&mut self, max_age_hours: f64, now: DateTime<Utc>) -> CleanupReport {
        let Some(cutoff) = retention_cutoff(now, max_age_hours) else {
            return CleanupReport::default();
        };
        let mut report = CleanupReport::default();

        self.vehicles.retain(|_, track| {
            let status_before = track.status_history.len();
            track.status_history.retain(|entry| entry.timestamp > cutoff);
            report.removed_status_entries += status_before - track.status_history.len();

            let scans_before = track.scan_history.len();
            track.scan_history.retain(|scan| scan.timestamp > cutoff);
            report.removed_scans += scans_before - track.scan_history.len();

            if track.is_empty() {
                report.removed_vehicles += 1;
                return false;
            }
            true
        });

        if report != CleanupReport::default() {
            tracing::info!(
                "Tracker cleanup: {} status entries, {} scans, {} vehicles removed",
                report.removed_status_entries,
                report.removed_scans,
                report.removed_vehicles
            );
        }
        report
    }

    pub fn remove_vehicle(&mut self, vehicle_id: &str) -> Result<()> {
        self.vehicles
            .remove(vehicle_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::UnknownVehicle(vehicle_id.to_string()))
    }

    /// Forget all vehicles.
    pub fn clear(&mut self) {
        self.vehicles.clear();
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn stats(&self) -> TrackerStats {
        self.vehicles
            .values()
            .fold(TrackerStats::default(), |stats, track| TrackerStats {
                tracked_vehicles: stats.tracked_vehicles + 1,
                status_entries: stats.status_entries + track.status_history.len(),
                scan_records: stats.scan_records + track.scan_history.len(),
            })
    }
}

fn is_moving(
    config: &TrackerConfig,
    sample: &TelemetrySample,
    previous: Option<&VehicleStatusEntry>,
) -> bool {
    if sample
        .speed_kmh
        .is_some_and(|speed| speed > config.movement_speed_threshold_kmh)
    {
        return true;
    }
    previous.is_some_and(|entry| {
        entry.coordinate.distance_m(&sample.coordinate()) > config.movement_displacement_threshold_m
    })
}

/// Every other vehicle within `radius_m`, nearest first. Duplicate ids keep the newest sample.
fn find_nearby(
    center_id: &str,
    center: &Coordinate,
    all_current: &[TelemetrySample],
    radius_m: f64,
    now: DateTime<Utc>,
) -> Vec<NearbyVehicle> {
    let mut latest: HashMap<&str, &TelemetrySample> = HashMap::new();
    for other in all_current {
        if other.vehicle_id == center_id {
            continue;
        }
        latest
            .entry(other.vehicle_id.as_str())
            .and_modify(|current| {
                if other.timestamp >= current.timestamp {
                    *current = other;
                }
            })
            .or_insert(other);
    }

    let mut nearby: Vec<NearbyVehicle> = latest
        .into_values()
        .filter_map(|other| {
            let coordinate = other.coordinate();
            let distance = center.distance_m(&coordinate);
            (distance <= radius_m).then(|| NearbyVehicle {
                id: other.vehicle_id.clone(),
                distance_meters: distance,
                coordinate,
                detected_at: now,
            })
        })
        .collect();
    nearby.sort_by(|a, b| {
        a.distance_meters
            .total_cmp(&b.distance_meters)
            .then_with(|| a.id.cmp(&b.id))
    });
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::destination_point;

    fn sample(
        id: &str,
        at: Coordinate,
        speed_kmh: f64,
        timestamp: DateTime<Utc>,
    ) -> TelemetrySample {
        TelemetrySample::new(id, at.latitude, at.longitude)
            .with_speed(speed_kmh)
            .at(timestamp)
    }

    #[test]
    fn stationary_vehicle_detects_neighbour_after_threshold() {
        let mut tracker = ProximityTracker::default();
        let v1 = Coordinate::new(40.4168, -3.7038);
        let v2 = destination_point(&v1, 50.0, 90.0);
        let t0 = Utc::now() - Duration::seconds(70);

        let mut first_scan_at = None;
        for step in 0..=7 {
            let now = t0 + Duration::seconds(step * 10);
            let s2 = sample("V2", v2, 0.0, now);
            let s1 = sample("V1", v1, 0.0, now);
            let all = vec![s1.clone(), s2.clone()];
            tracker.ingest_at(&s2, &all, now);
            let outcome = tracker.ingest_at(&s1, &all, now);
            assert!(!outcome.is_moving);
            if outcome.scan.is_some() && first_scan_at.is_none() {
                first_scan_at = Some(step * 10);
            }
        }

        assert_eq!(first_scan_at, Some(60));
        let nearby = tracker.nearby_vehicles("V1", 100.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, "V2");
        assert!((nearby[0].distance_meters - 50.0).abs() < 0.01);
        assert!(tracker.nearby_vehicles("V1", 40.0).is_empty());
    }

    #[test]
    fn wall_clock_ingest_uses_sample_history() {
        let mut tracker = ProximityTracker::default();
        let v1 = Coordinate::new(48.8566, 2.3522);
        let v2 = destination_point(&v1, 50.0, 180.0);
        let start = Utc::now() - Duration::seconds(70);

        let s1_old = sample("V1", v1, 0.0, start);
        let s2 = sample("V2", v2, 0.0, start);
        tracker.ingest(&s1_old, &[s1_old.clone(), s2.clone()]);

        let s1_now = sample("V1", v1, 0.0, Utc::now());
        let outcome = tracker.ingest(&s1_now, &[s1_now.clone(), s2]);
        let scan = outcome.scan.expect("scan after 70s stationary");
        assert!(scan.stationary_duration_seconds >= 70.0);
        assert_eq!(scan.nearby_vehicles[0].id, "V2");
    }

    #[test]
    fn first_sample_without_speed_is_not_moving() {
        let mut tracker = ProximityTracker::default();
        let s = TelemetrySample::new("V1", 10.0, 10.0);
        let outcome = tracker.ingest_at(&s, &[], s.timestamp);
        assert!(!outcome.is_moving);
        assert_eq!(outcome.stationary_duration_seconds, Some(0.0));
        assert!(outcome.scan.is_none());
    }

    #[test]
    fn speed_above_threshold_marks_moving() {
        let mut tracker = ProximityTracker::default();
        let now = Utc::now();
        let here = Coordinate::new(1.0, 1.0);
        let outcome = tracker.ingest_at(&sample("V1", here, 3.5, now), &[], now);
        assert!(outcome.is_moving);
        assert!(outcome.stationary_duration_seconds.is_none());

        let outcome = tracker.ingest_at(&sample("V1", here, 3.0, now), &[], now);
        assert!(!outcome.is_moving);
    }

    #[test]
    fn displacement_marks_moving_even_at_zero_speed() {
        let mut tracker = ProximityTracker::default();
        let start = Coordinate::new(52.52, 13.405);
        let now = Utc::now();
        tracker.ingest_at(&sample("V1", start, 0.0, now), &[], now);

        let small = destination_point(&start, 4.0, 0.0);
        assert!(!tracker.ingest_at(&sample("V1", small, 0.0, now), &[], now).is_moving);

        let jump = destination_point(&small, 6.0, 0.0);
        assert!(tracker.ingest_at(&sample("V1", jump, 0.0, now), &[], now).is_moving);
    }

    #[test]
    fn stationary_clock_restarts_at_latest_movement() {
        let mut tracker = ProximityTracker::default();
        let here = Coordinate::new(52.52, 13.405);
        let t0 = Utc::now();

        tracker.ingest_at(&sample("V1", here, 0.0, t0), &[], t0);
        let t_move = t0 + Duration::seconds(100);
        tracker.ingest_at(&sample("V1", here, 20.0, t_move), &[], t_move);

        let t_check = t_move + Duration::seconds(30);
        let outcome = tracker.ingest_at(&sample("V1", here, 0.0, t_check), &[], t_check);
        assert_eq!(outcome.stationary_duration_seconds, Some(30.0));
        assert!(outcome.scan.is_none());
    }

    #[test]
    fn scan_skips_self_and_far_vehicles() {
        let mut tracker = ProximityTracker::default();
        let here = Coordinate::new(35.0, 139.0);
        let t0 = Utc::now() - Duration::seconds(120);
        let now = Utc::now();

        let near = sample("NEAR", destination_point(&here, 80.0, 10.0), 0.0, now);
        let far = sample("FAR", destination_point(&here, 150.0, 10.0), 0.0, now);
        let stale_near = sample("NEAR", destination_point(&here, 500.0, 10.0), 0.0, t0);

        tracker.ingest_at(&sample("V1", here, 0.0, t0), &[], t0);
        let me = sample("V1", here, 0.0, now);
        let outcome = tracker.ingest_at(&me, &[me.clone(), stale_near, near, far], now);

        let scan = outcome.scan.expect("stationary for two minutes");
        assert_eq!(scan.nearby_vehicles.len(), 1);
        assert_eq!(scan.nearby_vehicles[0].id, "NEAR");
        assert_eq!(scan.center_vehicle_id, "V1");
        assert!(scan.is_stationary);
    }

    #[test]
    fn stationary_vehicles_lists_only_long_stops() {
        let mut tracker = ProximityTracker::default();
        let t0 = Utc::now();
        tracker.ingest_at(&sample("PARKED", Coordinate::new(1.0, 1.0), 0.0, t0), &[], t0);
        let brief = sample("BRIEF", Coordinate::new(2.0, 2.0), 0.0, t0 + Duration::seconds(50));
        tracker.ingest_at(&brief, &[], t0);
        tracker.ingest_at(&sample("DRIVING", Coordinate::new(3.0, 3.0), 40.0, t0), &[], t0);

        let stationary = tracker.stationary_vehicles_at(t0 + Duration::seconds(90));
        assert_eq!(stationary.len(), 1);
        assert_eq!(stationary[0].vehicle_id, "PARKED");
        assert_eq!(stationary[0].stationary_duration_seconds, 90.0);
    }

    #[test]
    fn cleanup_with_zero_retention_clears_everything() {
        let mut tracker = ProximityTracker::default();
        let t0 = Utc::now() - Duration::seconds(120);
        let here = Coordinate::new(1.0, 1.0);
        tracker.ingest_at(&sample("A", here, 0.0, t0), &[], t0);
        let later = t0 + Duration::seconds(90);
        tracker.ingest_at(&sample("A", here, 0.0, later), &[], later);
        tracker.ingest_at(&sample("B", here, 10.0, t0), &[], t0);
        assert_eq!(tracker.stats().scan_records, 1);

        let report = tracker.cleanup(0.0);
        assert_eq!(report.removed_status_entries, 3);
        assert_eq!(report.removed_scans, 1);
        assert_eq!(report.removed_vehicles, 2);
        assert_eq!(tracker.stats(), TrackerStats::default());
        assert!(tracker.nearby_vehicles("A", 100.0).is_empty());
    }

    #[test]
    fn cleanup_keeps_recent_history() {
        let mut tracker = ProximityTracker::default();
        let now = Utc::now();
        let old = now - Duration::hours(5);
        tracker.ingest_at(&sample("A", Coordinate::new(1.0, 1.0), 0.0, old), &[], old);
        tracker.ingest_at(&sample("A", Coordinate::new(1.0, 1.0), 0.0, now), &[], now);
        tracker.ingest_at(&sample("B", Coordinate::new(2.0, 2.0), 0.0, old), &[], old);

        let report = tracker.cleanup_at(2.0, now);
        assert_eq!(report.removed_vehicles, 1);
        assert_eq!(tracker.status_history("A").len(), 1);
        assert!(tracker.status_history("B").is_empty());
        // The scan taken at `now` survives.
        assert_eq!(tracker.scan_history("A", None).len(), 1);
    }

    #[test]
    fn unbounded_retention_keeps_everything() {
        let mut tracker = ProximityTracker::default();
        let now = Utc::now();
        let old = now - Duration::days(3650);
        tracker.ingest_at(&sample("A", Coordinate::new(1.0, 1.0), 0.0, old), &[], old);

        for hours in [f64::INFINITY, 1e10, f64::MAX] {
            assert_eq!(tracker.cleanup_at(hours, now), CleanupReport::default());
            assert_eq!(tracker.vehicle_count(), 1);
        }
        assert_eq!(tracker.cleanup(f64::INFINITY), CleanupReport::default());
    }

    #[test]
    fn negative_or_nan_retention_counts_as_zero() {
        let now = Utc::now();
        assert_eq!(retention_cutoff(now, -5.0), Some(now));
        assert_eq!(retention_cutoff(now, f64::NEG_INFINITY), Some(now));
        assert_eq!(retention_cutoff(now, f64::NAN), Some(now));
        assert_eq!(retention_cutoff(now, 2.0), Some(now - Duration::hours(2)));
        assert_eq!(retention_cutoff(now, f64::INFINITY), None);

        let mut tracker = ProximityTracker::default();
        let seen = now - Duration::seconds(1);
        tracker.ingest_at(&sample("A", Coordinate::new(1.0, 1.0), 0.0, seen), &[], seen);
        assert_eq!(tracker.cleanup_at(-1.0, now).removed_vehicles, 1);
    }

    #[test]
    fn scan_history_returns_latest_entries_in_order() {
        let mut tracker = ProximityTracker::default();
        let here = Coordinate::new(1.0, 1.0);
        let t0 = Utc::now() - Duration::minutes(10);
        tracker.ingest_at(&sample("A", here, 0.0, t0), &[], t0);
        for minute in 2..=5 {
            let now = t0 + Duration::minutes(minute);
            tracker.ingest_at(&sample("A", here, 0.0, now), &[], now);
        }
        let history = tracker.scan_history("A", Some(2));
        assert_eq!(history.len(), 2);
        assert!(history[0].timestamp < history[1].timestamp);
        assert_eq!(history[1].stationary_duration_seconds, 300.0);
        assert_eq!(tracker.scan_history("A", None).len(), 4);
        assert!(tracker.scan_history("missing", Some(3)).is_empty());
    }

    #[test]
    fn remove_vehicle_reports_unknown_ids() {
        let mut tracker = ProximityTracker::default();
        let now = Utc::now();
        tracker.ingest_at(&sample("A", Coordinate::new(1.0, 1.0), 0.0, now), &[], now);
        assert!(tracker.remove_vehicle("A").is_ok());
        assert_eq!(
            tracker.remove_vehicle("A"),
            Err(CoreError::UnknownVehicle("A".to_string()))
        );
        assert_eq!(tracker.vehicle_count(), 0);
    }
}
