//! Candidate egress segments around a vehicle's current position.

use serde::{Deserialize, Serialize};

use crate::models::Coordinate;
use crate::proximity::ProximityTracker;
use crate::spatial::{destination_point, distance_meters};

/// Bearings of the eight compass points, clockwise from north.
pub const COMPASS_BEARINGS: [f64; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub start: Coordinate,
    pub end: Coordinate,
    pub distance_meters: f64,
}

/// Eight straight segments of `max_distance_m` radiating from `origin`.
pub fn compass_segments(origin: &Coordinate, max_distance_m: f64) -> Vec<RouteSegment> {
    COMPASS_BEARINGS
        .iter()
        .map(|&bearing| {
            let end = destination_point(origin, max_distance_m, bearing);
            RouteSegment {
                start: *origin,
                end,
                distance_meters: distance_meters(origin, &end),
            }
        })
        .collect()
}

/// Egress segments from the latest known position of `vehicle_id`.
///
/// Empty when the tracker has no history for the vehicle.
pub fn vehicle_segments(
    tracker: &ProximityTracker,
    vehicle_id: &str,
    max_distance_m: f64,
) -> Vec<RouteSegment> {
    tracker
        .latest_coordinate(vehicle_id)
        .map(|origin| compass_segments(&origin, max_distance_m))
        .unwrap_or_default()
}
