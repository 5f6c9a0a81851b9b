//! Route exposure scoring against known risk zones.

use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, RiskLevel, RiskZone};

const MAX_ROUTE_SCORE: f64 = 100.0;
const SCORE_SCALE: f64 = 10.0;

/// Weight applied to a zone hit, by zone level.
pub fn risk_factor(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Critical => 10.0,
        RiskLevel::High => 7.0,
        RiskLevel::Medium => 4.0,
        RiskLevel::Low => 1.0,
    }
}

/// One route point falling inside one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneExposure {
    pub zone_index: usize,
    pub point_index: usize,
    pub distance_meters: f64,
    pub contribution: f64,
}

/// Score plus the individual hits that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRiskReport {
    pub score: u8,
    pub exposures: Vec<ZoneExposure>,
}

/// Score a route's exposure to `zones` on a 0-100 scale.
///
/// Each point inside a zone adds `factor * (1 - distance / radius)`, so hits near
/// the centroid weigh most. An empty route scores 0.
pub fn score_route(route: &[Coordinate], zones: &[RiskZone]) -> u8 {
    score_route_detailed(route, zones).score
}

pub fn score_route_detailed(route: &[Coordinate], zones: &[RiskZone]) -> RouteRiskReport {
    if route.is_empty() {
        return RouteRiskReport {
            score: 0,
            exposures: Vec::new(),
        };
    }

    let mut exposures = Vec::new();
    for (point_index, point) in route.iter().enumerate() {
        for (zone_index, zone) in zones.iter().enumerate() {
            if zone.radius_meters <= 0.0 {
                continue;
            }
            let distance = zone.centroid.distance_m(point);
            if distance > zone.radius_meters {
                continue;
            }
            exposures.push(ZoneExposure {
                zone_index,
                point_index,
                distance_meters: distance,
                contribution: risk_factor(zone.risk_level) * (1.0 - distance / zone.radius_meters),
            });
        }
    }

    let total: f64 = exposures.iter().map(|e| e.contribution).sum();
    let score = (total / route.len() as f64 * SCORE_SCALE)
        .min(MAX_ROUTE_SCORE)
        .round() as u8;

    RouteRiskReport { score, exposures }
}
