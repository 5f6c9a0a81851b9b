//! Service configuration from environment.

use std::env;
use std::str::FromStr;

use fleet_core::{AnalyticsRules, ClusterParams, TrackerConfig};

#[derive(Debug, Clone)]
pub struct Config {
    /// Number of tracker shards; each vehicle is owned by exactly one
    pub tracker_shards: usize,
    /// Queue depth per shard before ingestion applies backpressure
    pub shard_channel_capacity: usize,
    pub tracker: TrackerConfig,
    pub rules: AnalyticsRules,
    /// History older than this is dropped by the cleanup loop
    pub retention_hours: f64,
    pub cleanup_interval_secs: u64,
    pub hotspot_interval_secs: u64,
    /// Oldest alerts are discarded once the buffer holds this many
    pub alert_buffer_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker_shards: 4,
            shard_channel_capacity: 1024,
            tracker: TrackerConfig::default(),
            rules: AnalyticsRules::default(),
            retention_hours: 24.0,
            cleanup_interval_secs: 300,
            hotspot_interval_secs: 60,
            alert_buffer_limit: 50_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let tracker_defaults = TrackerConfig::default();
        let cluster_defaults = ClusterParams::default();

        Self {
            tracker_shards: env_or("FLEET_TRACKER_SHARDS", defaults.tracker_shards).max(1),
            shard_channel_capacity: env_or(
                "FLEET_SHARD_CHANNEL_CAPACITY",
                defaults.shard_channel_capacity,
            )
            .max(1),
            tracker: TrackerConfig {
                stationary_threshold_secs: env_or(
                    "FLEET_STATIONARY_THRESHOLD_SECS",
                    tracker_defaults.stationary_threshold_secs,
                ),
                proximity_radius_m: env_or(
                    "FLEET_PROXIMITY_RADIUS_M",
                    tracker_defaults.proximity_radius_m,
                ),
                movement_speed_threshold_kmh: env_or(
                    "FLEET_MOVEMENT_SPEED_KMH",
                    tracker_defaults.movement_speed_threshold_kmh,
                ),
                movement_displacement_threshold_m: env_or(
                    "FLEET_MOVEMENT_DISPLACEMENT_M",
                    tracker_defaults.movement_displacement_threshold_m,
                ),
            },
            rules: AnalyticsRules {
                cluster: ClusterParams {
                    epsilon_km: env_or("FLEET_CLUSTER_EPSILON_KM", cluster_defaults.epsilon_km),
                    min_points: env_or("FLEET_CLUSTER_MIN_POINTS", cluster_defaults.min_points),
                },
                ..defaults.rules
            },
            retention_hours: env_or("FLEET_RETENTION_HOURS", defaults.retention_hours),
            cleanup_interval_secs: env_or(
                "FLEET_CLEANUP_INTERVAL_SECS",
                defaults.cleanup_interval_secs,
            )
            .max(1),
            hotspot_interval_secs: env_or(
                "FLEET_HOTSPOT_INTERVAL_SECS",
                defaults.hotspot_interval_secs,
            )
            .max(1),
            alert_buffer_limit: env_or("FLEET_ALERT_BUFFER_LIMIT", defaults.alert_buffer_limit),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
