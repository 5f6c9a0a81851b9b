//! Input file loading.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use fleet_core::{AlertRecord, Coordinate};

#[derive(Deserialize)]
#[serde(untagged)]
enum AlertFile {
    List(Vec<AlertRecord>),
    Wrapped { alerts: Vec<AlertRecord> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoutePoint {
    Pair([f64; 2]),
    Object(Coordinate),
}

/// Alerts from a JSON array, or an object with an `alerts` array.
pub fn parse_alerts(json: &str) -> Result<Vec<AlertRecord>> {
    let file: AlertFile = serde_json::from_str(json).context("invalid alert JSON")?;
    Ok(match file {
        AlertFile::List(alerts) | AlertFile::Wrapped { alerts } => alerts,
    })
}

pub fn load_alerts(path: &Path) -> Result<Vec<AlertRecord>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_alerts(&json).with_context(|| format!("in {}", path.display()))
}

/// Route points as `[lat, lon]` pairs or `{"latitude", "longitude"}` objects.
pub fn parse_route(json: &str) -> Result<Vec<Coordinate>> {
    let points: Vec<RoutePoint> = serde_json::from_str(json).context("invalid route JSON")?;
    points
        .into_iter()
        .enumerate()
        .map(|(idx, point)| {
            let coordinate = match point {
                RoutePoint::Pair([latitude, longitude]) => Coordinate::new(latitude, longitude),
                RoutePoint::Object(coordinate) => coordinate,
            };
            if !coordinate.is_finite() {
                bail!("route point {} is not a finite coordinate", idx);
            }
            Ok(coordinate)
        })
        .collect()
}

pub fn load_route(path: &Path) -> Result<Vec<Coordinate>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_route(&json).with_context(|| format!("in {}", path.display()))
}
