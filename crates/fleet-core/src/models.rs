//! Core data models shared by the analytics and tracking components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// A WGS-84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Exactly `(0, 0)`. Upstream sources use this as "no location".
    pub fn is_null_island(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        crate::spatial::distance_meters(self, other)
    }
}

/// Severity attached to an incoming alert.
///
/// The alert source emits `info`, `warning` and `critical`; other producers in the
/// fleet also send `low`, `medium` and `high`. Anything else maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Low,
    Medium,
    Warning,
    High,
    Critical,
    #[serde(other)]
    Other,
}

impl AlertSeverity {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Self::Info,
            "low" => Self::Low,
            "medium" => Self::Medium,
            "warning" => Self::Warning,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Other,
        }
    }
}

/// Location metadata carried by an alert. Producers attach arbitrary extra keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertMetadata {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Alert record as produced by the detection services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: AlertMetadata,
}

/// A located alert, ready for clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPoint {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub severity: AlertSeverity,
    #[serde(rename = "type")]
    pub alert_type: String,
}

impl AlertPoint {
    /// Extract a clusterable point from an alert.
    ///
    /// Returns `Ok(None)` when the alert has no location: either coordinate missing,
    /// or both exactly zero. Non-finite coordinates are rejected.
    pub fn try_from_record(record: &AlertRecord) -> Result<Option<Self>> {
        let (Some(latitude), Some(longitude)) =
            (record.metadata.latitude, record.metadata.longitude)
        else {
            return Ok(None);
        };

        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.is_finite() {
            return Err(CoreError::InvalidCoordinate {
                context: format!("alert {}", record.id),
                latitude,
                longitude,
            });
        }
        if coordinate.is_null_island() {
            return Ok(None);
        }

        Ok(Some(Self {
            id: record.id,
            latitude,
            longitude,
            timestamp: record.timestamp,
            severity: AlertSeverity::parse(&record.severity),
            alert_type: record.alert_type.clone(),
        }))
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Risk category derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Map a numeric score onto a category: >=80 critical, >=60 high, >=30 medium.
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Critical
        } else if score >= 60 {
            Self::High
        } else if score >= 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn is_high_risk(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, radius-bounded area of elevated risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskZone {
    /// Assigned by the persistence layer; `None` until stored.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub centroid: Coordinate,
    pub radius_meters: f64,
    pub risk_level: RiskLevel,
    pub description: String,
}

impl RiskZone {
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.centroid.distance_m(coordinate) <= self.radius_meters
    }
}

/// One telemetry sample for a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed_kmh: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl TelemetrySample {
    pub fn new(vehicle_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            latitude,
            longitude,
            speed_kmh: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = Some(speed_kmh);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Reject samples that cannot be placed on the globe.
    pub fn validate(&self) -> Result<()> {
        let coordinate = self.coordinate();
        if !coordinate.is_finite()
            || !(-90.0..=90.0).contains(&self.latitude)
            || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(CoreError::InvalidCoordinate {
                context: format!("vehicle {}", self.vehicle_id),
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        Ok(())
    }
}
