//! Density-based clustering of geographic points.
//!
//! A point is a core point when at least `min_points` points (itself included)
//! lie within `epsilon_km`. Clusters grow from core points; border points join
//! the first cluster that reaches them. Points rejected as noise when first
//! visited stay noise even if a later cluster reaches them.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{CoreError, Result};
use crate::models::Coordinate;
use crate::spatial::distance_km;

pub const DEFAULT_EPSILON_KM: f64 = 0.01;
pub const DEFAULT_MIN_POINTS: usize = 3;

/// Neighborhood radius and core-point threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterParams {
    pub epsilon_km: f64,
    pub min_points: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            epsilon_km: DEFAULT_EPSILON_KM,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

impl ClusterParams {
    pub fn new(epsilon_km: f64, min_points: usize) -> Result<Self> {
        let params = Self {
            epsilon_km,
            min_points,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epsilon_km.is_finite() || self.epsilon_km <= 0.0 {
            return Err(CoreError::InvalidParameter {
                name: "epsilon_km",
                message: format!("must be a positive distance, got {}", self.epsilon_km),
            });
        }
        if self.min_points == 0 {
            return Err(CoreError::InvalidParameter {
                name: "min_points",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Clusters plus the points that were rejected as noise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterOutcome {
    /// Point indices per cluster, ascending within each cluster.
    pub clusters: Vec<Vec<usize>>,
    /// Indices of points that belong to no cluster, ascending.
    pub noise: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Member(usize),
}

/// Cluster `points`, dropping noise.
pub fn cluster_points(points: &[Coordinate], params: &ClusterParams) -> Vec<Vec<usize>> {
    cluster_with_noise(points, params).clusters
}

/// Cluster `points` and also report which indices ended up as noise.
pub fn cluster_with_noise(points: &[Coordinate], params: &ClusterParams) -> ClusterOutcome {
    let mut labels = vec![Label::Unvisited; points.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for idx in 0..points.len() {
        if labels[idx] != Label::Unvisited {
            continue;
        }

        let neighbors = region_query(points, idx, params.epsilon_km);
        if neighbors.len() < params.min_points {
            labels[idx] = Label::Noise;
            continue;
        }

        let cluster_id = clusters.len();
        labels[idx] = Label::Member(cluster_id);
        let mut members = vec![idx];
        let mut queue: VecDeque<usize> = neighbors.into_iter().collect();

        while let Some(candidate) = queue.pop_front() {
            if labels[candidate] != Label::Unvisited {
                continue;
            }
            labels[candidate] = Label::Member(cluster_id);
            members.push(candidate);

            let candidate_neighbors = region_query(points, candidate, params.epsilon_km);
            if candidate_neighbors.len() >= params.min_points {
                queue.extend(
                    candidate_neighbors
                        .into_iter()
                        .filter(|&n| labels[n] == Label::Unvisited),
                );
            }
        }

        members.sort_unstable();
        clusters.push(members);
    }

    let noise = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| **label == Label::Noise)
        .map(|(idx, _)| idx)
        .collect();

    ClusterOutcome { clusters, noise }
}

/// Indices of all points within `epsilon_km` of `points[idx]`, including `idx` itself.
fn region_query(points: &[Coordinate], idx: usize, epsilon_km: f64) -> Vec<usize> {
    let origin = &points[idx];
    points
        .iter()
        .enumerate()
        .filter(|(_, other)| distance_km(origin, other) <= epsilon_km)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::destination_point;

    fn params(epsilon_km: f64, min_points: usize) -> ClusterParams {
        ClusterParams::new(epsilon_km, min_points).unwrap()
    }

    #[test]
    fn dense_group_clusters_and_isolated_point_is_dropped() {
        let base = Coordinate::new(40.4168, -3.7038);
        let eps_km = 0.05;
        let points = vec![
            base,
            destination_point(&base, 10.0, 0.0),
            destination_point(&base, 10.0, 90.0),
            destination_point(&base, 10.0, 180.0),
            destination_point(&base, eps_km * 1000.0 * 100.0, 45.0),
        ];

        let outcome = cluster_with_noise(&points, &params(eps_km, 3));
        assert_eq!(outcome.clusters, vec![vec![0, 1, 2, 3]]);
        assert_eq!(outcome.noise, vec![4]);
        assert_eq!(cluster_points(&points, &params(eps_km, 3)).len(), 1);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let outcome = cluster_with_noise(&[], &ClusterParams::default());
        assert!(outcome.clusters.is_empty());
        assert!(outcome.noise.is_empty());
    }

    #[test]
    fn sparse_points_are_all_noise() {
        let base = Coordinate::new(10.0, 10.0);
        let points: Vec<Coordinate> = (0..4)
            .map(|i| destination_point(&base, 1_000.0 * i as f64, 90.0))
            .collect();
        let outcome = cluster_with_noise(&points, &params(0.1, 2));
        assert!(outcome.clusters.is_empty());
        assert_eq!(outcome.noise, vec![0, 1, 2, 3]);
    }

    #[test]
    fn chain_of_core_points_forms_one_cluster() {
        // Points 40 m apart along a line; with min_points 2 every point is a core point.
        let base = Coordinate::new(33.0, -117.0);
        let points: Vec<Coordinate> = (0..6)
            .map(|i| destination_point(&base, 40.0 * i as f64, 0.0))
            .collect();
        let clusters = cluster_points(&points, &params(0.05, 2));
        assert_eq!(clusters, vec![vec![0, 1, 2, 3, 4, 5]]);
    }

    #[test]
    fn border_point_joins_reaching_cluster() {
        // Index 0 is the only core point. Index 4 lies within epsilon of index 2 alone,
        // and index 2 is a border point, so the expansion never reaches 4.
        let base = Coordinate::new(0.5, 0.5);
        let points = vec![
            base,
            destination_point(&base, 40.0, 270.0),
            destination_point(&base, 40.0, 90.0),
            destination_point(&base, 40.0, 0.0),
            destination_point(&base, 80.0, 90.0),
        ];
        let outcome = cluster_with_noise(&points, &params(0.045, 4));
        assert_eq!(outcome.clusters, vec![vec![0, 1, 2, 3]]);
        assert_eq!(outcome.noise, vec![4]);
    }

    #[test]
    fn early_noise_is_never_resurrected() {
        // Index 0 sits within epsilon of only one other point, so it is visited first
        // and rejected. The dense group that later reaches it must not absorb it.
        let base = Coordinate::new(45.0, 7.0);
        let points = vec![
            destination_point(&base, 45.0, 180.0),
            base,
            destination_point(&base, 20.0, 0.0),
            destination_point(&base, 20.0, 60.0),
            destination_point(&base, 20.0, 300.0),
        ];
        let outcome = cluster_with_noise(&points, &params(0.05, 3));
        assert_eq!(outcome.noise, vec![0]);
        assert_eq!(outcome.clusters, vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn separate_groups_form_separate_clusters() {
        let a = Coordinate::new(40.0, -3.0);
        let b = destination_point(&a, 5_000.0, 90.0);
        let mut points = Vec::new();
        for origin in [a, b] {
            points.push(origin);
            points.push(destination_point(&origin, 5.0, 0.0));
            points.push(destination_point(&origin, 5.0, 120.0));
        }
        let clusters = cluster_points(&points, &ClusterParams::default());
        assert_eq!(clusters, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(ClusterParams::new(0.0, 3).is_err());
        assert!(ClusterParams::new(f64::NAN, 3).is_err());
        assert!(ClusterParams::new(0.01, 0).is_err());
    }
}
