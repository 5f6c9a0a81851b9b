//! Risk scoring for incident clusters.
//!
//! Score = base (5 per alert, capped at 50) + per-alert severity, type and
//! recency addends, clamped to 0..=100.

use chrono::{DateTime, Utc};

use crate::models::{AlertPoint, AlertSeverity, RiskLevel};

const BASE_PER_ALERT: u32 = 5;
const BASE_CAP: u32 = 50;
const MAX_SCORE: u32 = 100;
const SECONDS_PER_DAY: f64 = 86_400.0;

fn severity_weight(severity: AlertSeverity) -> u32 {
    match severity {
        AlertSeverity::Critical => 20,
        AlertSeverity::High => 10,
        AlertSeverity::Medium => 5,
        _ => 1,
    }
}

/// Keyword addends are independent: a type naming both earns both.
fn type_weight(alert_type: &str) -> u32 {
    let mut weight = 0;
    if alert_type.contains("weapon") {
        weight += 15;
    }
    if alert_type.contains("tamper") {
        weight += 8;
    }
    weight
}

fn recency_weight(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let age_days = (now - timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
    if age_days < 7.0 {
        10
    } else if age_days < 30.0 {
        5
    } else if age_days < 90.0 {
        2
    } else {
        0
    }
}

/// Contribution of a single alert, excluding the size-based base.
pub fn alert_weight(point: &AlertPoint, now: DateTime<Utc>) -> u32 {
    severity_weight(point.severity)
        + type_weight(&point.alert_type)
        + recency_weight(point.timestamp, now)
}

/// Score a cluster of alerts relative to `now`.
pub fn score_cluster<'a, I>(points: I, now: DateTime<Utc>) -> u8
where
    I: IntoIterator<Item = &'a AlertPoint>,
{
    let (count, addends) = points
        .into_iter()
        .fold((0u32, 0u32), |(count, sum), point| {
            (count + 1, sum.saturating_add(alert_weight(point, now)))
        });

    let base = count.saturating_mul(BASE_PER_ALERT).min(BASE_CAP);
    base.saturating_add(addends).min(MAX_SCORE) as u8
}

/// Score a cluster and derive its category.
pub fn assess_cluster<'a, I>(points: I, now: DateTime<Utc>) -> (u8, RiskLevel)
where
    I: IntoIterator<Item = &'a AlertPoint>,
{
    let score = score_cluster(points, now);
    (score, RiskLevel::from_score(score))
}
