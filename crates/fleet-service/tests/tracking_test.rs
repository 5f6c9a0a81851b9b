//! End-to-end runtime tests: telemetry through the sharded tracker, alert
//! buffering into hotspots and zones, and retention cleanup.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fleet_core::{
    destination_point, AlertMetadata, AlertRecord, Coordinate, RiskLevel, TelemetrySample,
};
use fleet_service::events::{run_event_stream, EventClock, StreamSummary};
use fleet_service::{AppState, Config};

fn parked(id: &str, at: Coordinate, timestamp: DateTime<Utc>) -> TelemetrySample {
    TelemetrySample::new(id, at.latitude, at.longitude)
        .with_speed(0.0)
        .at(timestamp)
}

fn telemetry_line(id: &str, at: Coordinate, timestamp: DateTime<Utc>) -> String {
    let mut line = serde_json::json!({
        "kind": "telemetry",
        "vehicleId": id,
        "latitude": at.latitude,
        "longitude": at.longitude,
        "speedKmh": 0.0,
        "timestamp": timestamp,
    })
    .to_string();
    line.push('\n');
    line
}

/// Six rounds of reports 20s apart from two vehicles parked ~33m apart.
fn parked_pair_stream(t0: DateTime<Utc>) -> String {
    let mut input = String::new();
    for step in 0..6 {
        let at = t0 + Duration::seconds(step * 20);
        for (id, lon) in [("A", 0.0), ("B", 0.0003)] {
            input.push_str(&telemetry_line(id, Coordinate::new(1.0, lon), at));
        }
    }
    input
}

async fn replay(
    state: AppState,
    input: &str,
    clock: EventClock,
) -> (StreamSummary, Vec<serde_json::Value>) {
    let mut out = Vec::new();
    let summary = run_event_stream(Arc::new(state), input.as_bytes(), &mut out, clock)
        .await
        .unwrap();
    let lines = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (summary, lines)
}

fn alert(id: i64, severity: &str, alert_type: &str, at: Coordinate, age: Duration) -> AlertRecord {
    AlertRecord {
        id,
        alert_type: alert_type.to_string(),
        severity: severity.to_string(),
        timestamp: Utc::now() - age,
        metadata: AlertMetadata {
            latitude: Some(at.latitude),
            longitude: Some(at.longitude),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn parked_pair_is_detected_after_threshold() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let v1 = Coordinate::new(34.05, -118.25);
    let v2 = destination_point(&v1, 50.0, 90.0);
    let t0 = Utc::now() - Duration::seconds(120);

    // V2 reports once, then V1 reports every 15s while parked.
    state
        .ingest_telemetry_at(parked("V2", v2, t0), t0)
        .await
        .unwrap();

    let mut first_scan_at = None;
    for step in 0..=6 {
        let now = t0 + Duration::seconds(step * 15);
        let outcome = state
            .ingest_telemetry_at(parked("V1", v1, now), now)
            .await
            .unwrap();
        assert!(!outcome.is_moving);
        if outcome.scan.is_some() && first_scan_at.is_none() {
            first_scan_at = Some(step * 15);
        }
    }
    // 60s threshold is reached on the fifth report.
    assert_eq!(first_scan_at, Some(60));

    let nearby = state.nearby_vehicles("V1", 100.0).await.unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].id, "V2");
    assert!((nearby[0].distance_meters - 50.0).abs() < 0.01);
    assert!(state.nearby_vehicles("V1", 40.0).await.unwrap().is_empty());

    let history = state.scan_history("V1", Some(2)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].timestamp < history[1].timestamp);

    let stationary = state
        .stationary_vehicles_at(t0 + Duration::seconds(90))
        .await
        .unwrap();
    let ids: Vec<&str> = stationary.iter().map(|v| v.vehicle_id.as_str()).collect();
    assert_eq!(ids, vec!["V1", "V2"]);

    assert_eq!(state.vehicle_segments("V1", 300.0).await.unwrap().len(), 8);
}

#[tokio::test]
async fn moving_vehicle_is_never_scanned() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let start = Coordinate::new(48.85, 2.35);
    let t0 = Utc::now() - Duration::minutes(10);

    for step in 0..10 {
        let at = destination_point(&start, 200.0 * step as f64, 0.0);
        let now = t0 + Duration::seconds(step * 30);
        let sample = TelemetrySample::new("MOVER", at.latitude, at.longitude)
            .with_speed(40.0)
            .at(now);
        let outcome = state.ingest_telemetry_at(sample, now).await.unwrap();
        assert!(outcome.is_moving);
        assert!(outcome.scan.is_none());
    }

    assert!(state.scan_history("MOVER", None).await.unwrap().is_empty());
    assert!(state.stationary_vehicles().await.unwrap().is_empty());
}

#[tokio::test]
async fn cleanup_with_zero_retention_clears_everything() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let base = Coordinate::new(-33.86, 151.2);
    let t0 = Utc::now() - Duration::hours(2);

    for i in 0..40 {
        let at = destination_point(&base, 25.0 * i as f64, (i * 37 % 360) as f64);
        state
            .ingest_telemetry_at(parked(&format!("V{i:02}"), at, t0), t0)
            .await
            .unwrap();
    }
    let stats = state.stats().await.unwrap();
    assert_eq!(stats.tracker.tracked_vehicles, 40);
    assert_eq!(stats.known_positions, 40);

    let report = state.cleanup_at(0.0, Utc::now()).await.unwrap();
    assert_eq!(report.removed_vehicles, 40);
    assert_eq!(report.removed_status_entries, 40);

    let stats = state.stats().await.unwrap();
    assert_eq!(stats.tracker.tracked_vehicles, 0);
    assert_eq!(stats.known_positions, 0);
}

#[tokio::test]
async fn retention_keeps_recent_history() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let now = Utc::now();
    let here = Coordinate::new(10.0, 10.0);

    for (id, age) in [("OLD", Duration::hours(30)), ("NEW", Duration::hours(1))] {
        let seen = now - age;
        state
            .ingest_telemetry_at(parked(id, here, seen), seen)
            .await
            .unwrap();
    }

    let report = state.cleanup_at(24.0, now).await.unwrap();
    assert_eq!(report.removed_vehicles, 1);
    assert!(state.latest_position("OLD").is_none());
    assert!(state.latest_position("NEW").is_some());
}

#[tokio::test]
async fn alerts_become_zones_that_score_routes() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let depot = Coordinate::new(19.43, -99.13);

    // Tight critical cluster at the depot, a pair elsewhere, and unlocated noise.
    for i in 0..5 {
        let at = destination_point(&depot, 2.0 * i as f64, 90.0);
        state.record_alert(alert(i, "critical", "weapon_detected", at, Duration::days(1)));
    }
    let far = destination_point(&depot, 5_000.0, 0.0);
    for i in 10..13 {
        let at = destination_point(&far, 3.0 * (i - 10) as f64, 180.0);
        state.record_alert(alert(i, "low", "door_open", at, Duration::days(200)));
    }
    state.record_alert(AlertRecord {
        metadata: AlertMetadata::default(),
        ..alert(99, "high", "tamper", depot, Duration::zero())
    });

    let analysis = state.refresh_hotspots().await.unwrap();
    assert_eq!(analysis.total_alerts_analyzed, 9);
    assert_eq!(analysis.clusters.len(), 2);
    assert_eq!(analysis.high_risk_clusters, 1);

    let zones = state.risk_zones();
    assert_eq!(zones.len(), 2);
    let critical = zones
        .iter()
        .find(|z| z.risk_level == RiskLevel::Critical)
        .unwrap();
    assert!(critical.contains(&depot));
    assert_eq!(critical.radius_meters, 500.0);

    let through_depot = state.route_risk(&[depot, destination_point(&depot, 100.0, 0.0)]);
    let around = state.route_risk(&[destination_point(&depot, 2_000.0, 270.0)]);
    assert!(through_depot.score > 0);
    assert_eq!(around.score, 0);
    assert!(state.hotspots().is_some());
}

#[tokio::test]
async fn retention_overflow_keeps_everything_and_negative_clears() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let now = Utc::now();
    let here = Coordinate::new(10.0, 10.0);
    let seen = now - Duration::days(3650);
    state
        .ingest_telemetry_at(parked("ANCIENT", here, seen), seen)
        .await
        .unwrap();

    for hours in [f64::INFINITY, 1e10, f64::MAX] {
        let report = state.cleanup_at(hours, now).await.unwrap();
        assert_eq!(report.removed_vehicles, 0);
    }
    // The shard survived and nothing was pruned.
    let stats = state.stats().await.unwrap();
    assert_eq!(stats.tracker.tracked_vehicles, 1);
    assert_eq!(stats.known_positions, 1);

    let report = state.cleanup_at(-1.0, now).await.unwrap();
    assert_eq!(report.removed_vehicles, 1);
    let stats = state.stats().await.unwrap();
    assert_eq!(stats.tracker.tracked_vehicles, 0);
    assert_eq!(stats.known_positions, 0);
}

#[tokio::test]
async fn event_stream_measures_stops_against_wall_clock() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let t0 = Utc::now() - Duration::seconds(200);

    let (summary, lines) = replay(state, &parked_pair_stream(t0), EventClock::WallClock).await;

    // Both vehicles have been parked since t0, over 60s before arrival, so
    // every report scans. The first one precedes B's first position.
    assert_eq!(
        summary,
        StreamSummary {
            telemetry: 12,
            alerts: 0,
            scans: 12,
            rejected: 0,
            latest_timestamp: Some(t0 + Duration::seconds(100)),
        }
    );
    assert_eq!(lines.len(), 12);
    assert!(lines.iter().all(|line| line["kind"] == "scan"));
    let nearby: Vec<usize> = lines
        .iter()
        .map(|line| line["nearbyVehicles"].as_array().unwrap().len())
        .collect();
    assert_eq!(nearby[0], 0);
    assert!(nearby[1..].iter().all(|&n| n == 1));
}

#[tokio::test]
async fn event_stream_reports_pair_parked_before_first_report() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let v1 = Coordinate::new(34.05, -118.25);
    let v2 = destination_point(&v1, 44.0, 90.0);
    let seen = Utc::now() - Duration::seconds(120);

    let input = telemetry_line("V2", v2, seen) + &telemetry_line("V1", v1, seen);
    let (summary, lines) = replay(state, &input, EventClock::WallClock).await;

    assert_eq!(summary.scans, 2);
    assert_eq!(lines[1]["centerVehicleId"], "V1");
    assert_eq!(lines[1]["nearbyVehicles"][0]["id"], "V2");
}

#[tokio::test]
async fn event_stream_can_replay_in_sample_time() {
    let (state, _shards) = AppState::new(Config::default()).unwrap();
    let t0 = Utc::now() - Duration::seconds(200);

    let (summary, lines) = replay(state, &parked_pair_stream(t0), EventClock::SampleTime).await;

    // Each vehicle crosses the 60s threshold at t0+60s, then scans on every report.
    assert_eq!(
        summary,
        StreamSummary {
            telemetry: 12,
            alerts: 0,
            scans: 6,
            rejected: 0,
            latest_timestamp: Some(t0 + Duration::seconds(100)),
        }
    );
    assert_eq!(lines.len(), 6);
    for line in &lines {
        assert_eq!(line["kind"], "scan");
        assert_eq!(line["nearbyVehicles"].as_array().unwrap().len(), 1);
    }
}
