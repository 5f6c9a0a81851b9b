//! Sharded proximity tracking.
//!
//! Each shard is a task that exclusively owns one [`ProximityTracker`]. Samples
//! are routed by a hash of the vehicle id, so every vehicle has a single owner
//! and its samples are applied in the order they were sent. Fleet-wide queries
//! fan out to all shards and merge the replies.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use fleet_core::{
    vehicle_segments, CleanupReport, IngestOutcome, NearbyVehicle, ProximityScan,
    ProximityTracker, RouteSegment, StationaryVehicle, TelemetrySample, TrackerConfig,
    TrackerStats,
};

use crate::error::{ServiceError, ServiceResult};

enum ShardCommand {
    Ingest {
        sample: TelemetrySample,
        snapshot: Vec<TelemetrySample>,
        now: DateTime<Utc>,
        reply: oneshot::Sender<IngestOutcome>,
    },
    Nearby {
        vehicle_id: String,
        radius_m: f64,
        reply: oneshot::Sender<Vec<NearbyVehicle>>,
    },
    ScanHistory {
        vehicle_id: String,
        limit: Option<usize>,
        reply: oneshot::Sender<Vec<ProximityScan>>,
    },
    Segments {
        vehicle_id: String,
        max_distance_m: f64,
        reply: oneshot::Sender<Vec<RouteSegment>>,
    },
    Stationary {
        now: DateTime<Utc>,
        reply: oneshot::Sender<Vec<StationaryVehicle>>,
    },
    Cleanup {
        max_age_hours: f64,
        now: DateTime<Utc>,
        reply: oneshot::Sender<CleanupReport>,
    },
    Stats {
        reply: oneshot::Sender<TrackerStats>,
    },
}

/// Handle to a set of tracker shards. Dropping it stops the shard tasks.
pub struct ShardedTracker {
    shards: Vec<mpsc::Sender<ShardCommand>>,
}

impl ShardedTracker {
    /// Spawn `shard_count` shard tasks on the current runtime.
    pub fn spawn(
        shard_count: usize,
        channel_capacity: usize,
        config: TrackerConfig,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let shard_count = shard_count.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        let mut handles = Vec::with_capacity(shard_count);

        for index in 0..shard_count {
            let (tx, rx) = mpsc::channel(channel_capacity.max(1));
            handles.push(tokio::spawn(run_shard(
                index,
                rx,
                ProximityTracker::new(config.clone()),
            )));
            shards.push(tx);
        }

        tracing::info!("Started {} tracker shard(s)", shard_count);
        (Self { shards }, handles)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard owning `vehicle_id`.
    pub fn shard_index(&self, vehicle_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        vehicle_id.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    pub async fn ingest(
        &self,
        sample: TelemetrySample,
        snapshot: Vec<TelemetrySample>,
    ) -> ServiceResult<IngestOutcome> {
        self.ingest_at(sample, snapshot, Utc::now()).await
    }

    pub async fn ingest_at(
        &self,
        sample: TelemetrySample,
        snapshot: Vec<TelemetrySample>,
        now: DateTime<Utc>,
    ) -> ServiceResult<IngestOutcome> {
        let index = self.shard_index(&sample.vehicle_id);
        self.request(index, |reply| ShardCommand::Ingest {
            sample,
            snapshot,
            now,
            reply,
        })
        .await
    }

    pub async fn nearby_vehicles(
        &self,
        vehicle_id: &str,
        radius_m: f64,
    ) -> ServiceResult<Vec<NearbyVehicle>> {
        let index = self.shard_index(vehicle_id);
        let vehicle_id = vehicle_id.to_string();
        self.request(index, |reply| ShardCommand::Nearby {
            vehicle_id,
            radius_m,
            reply,
        })
        .await
    }

    pub async fn scan_history(
        &self,
        vehicle_id: &str,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<ProximityScan>> {
        let index = self.shard_index(vehicle_id);
        let vehicle_id = vehicle_id.to_string();
        self.request(index, |reply| ShardCommand::ScanHistory {
            vehicle_id,
            limit,
            reply,
        })
        .await
    }

    pub async fn segments(
        &self,
        vehicle_id: &str,
        max_distance_m: f64,
    ) -> ServiceResult<Vec<RouteSegment>> {
        let index = self.shard_index(vehicle_id);
        let vehicle_id = vehicle_id.to_string();
        self.request(index, |reply| ShardCommand::Segments {
            vehicle_id,
            max_distance_m,
            reply,
        })
        .await
    }

    pub async fn stationary_vehicles(&self) -> ServiceResult<Vec<StationaryVehicle>> {
        self.stationary_vehicles_at(Utc::now()).await
    }

    pub async fn stationary_vehicles_at(
        &self,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<StationaryVehicle>> {
        let per_shard = self
            .broadcast(|reply| ShardCommand::Stationary { now, reply })
            .await?;
        let mut merged: Vec<StationaryVehicle> = per_shard.into_iter().flatten().collect();
        merged.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        Ok(merged)
    }

    pub async fn cleanup(&self, max_age_hours: f64) -> ServiceResult<CleanupReport> {
        self.cleanup_at(max_age_hours, Utc::now()).await
    }

    pub async fn cleanup_at(
        &self,
        max_age_hours: f64,
        now: DateTime<Utc>,
    ) -> ServiceResult<CleanupReport> {
        let per_shard = self
            .broadcast(|reply| ShardCommand::Cleanup {
                max_age_hours,
                now,
                reply,
            })
            .await?;
        Ok(per_shard
            .into_iter()
            .fold(CleanupReport::default(), CleanupReport::merge))
    }

    pub async fn stats(&self) -> ServiceResult<TrackerStats> {
        let per_shard = self
            .broadcast(|reply| ShardCommand::Stats { reply })
            .await?;
        Ok(per_shard
            .into_iter()
            .fold(TrackerStats::default(), TrackerStats::merge))
    }

    async fn request<T>(
        &self,
        index: usize,
        build: impl FnOnce(oneshot::Sender<T>) -> ShardCommand,
    ) -> ServiceResult<T> {
        let (reply, response) = oneshot::channel();
        self.shards[index]
            .send(build(reply))
            .await
            .map_err(|_| ServiceError::ShardUnavailable(index))?;
        response
            .await
            .map_err(|_| ServiceError::ShardUnavailable(index))
    }

    async fn broadcast<T>(
        &self,
        build: impl Fn(oneshot::Sender<T>) -> ShardCommand,
    ) -> ServiceResult<Vec<T>> {
        let mut pending = Vec::with_capacity(self.shards.len());
        for (index, shard) in self.shards.iter().enumerate() {
            let (reply, response) = oneshot::channel();
            shard
                .send(build(reply))
                .await
                .map_err(|_| ServiceError::ShardUnavailable(index))?;
            pending.push(async move {
                response
                    .await
                    .map_err(|_| ServiceError::ShardUnavailable(index))
            });
        }
        join_all(pending).await.into_iter().collect()
    }
}

async fn run_shard(
    index: usize,
    mut rx: mpsc::Receiver<ShardCommand>,
    mut tracker: ProximityTracker,
) {
    while let Some(command) = rx.recv().await {
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            ShardCommand::Ingest {
                sample,
                snapshot,
                now,
                reply,
            } => {
                let outcome = tracker.ingest_at(&sample, &snapshot, now);
                let _ = reply.send(outcome);
            }
            ShardCommand::Nearby {
                vehicle_id,
                radius_m,
                reply,
            } => {
                let _ = reply.send(tracker.nearby_vehicles(&vehicle_id, radius_m));
            }
            ShardCommand::ScanHistory {
                vehicle_id,
                limit,
                reply,
            } => {
                let _ = reply.send(tracker.scan_history(&vehicle_id, limit));
            }
            ShardCommand::Segments {
                vehicle_id,
                max_distance_m,
                reply,
            } => {
                let _ = reply.send(vehicle_segments(&tracker, &vehicle_id, max_distance_m));
            }
            ShardCommand::Stationary { now, reply } => {
                let _ = reply.send(tracker.stationary_vehicles_at(now));
            }
            ShardCommand::Cleanup {
                max_age_hours,
                now,
                reply,
            } => {
                let _ = reply.send(tracker.cleanup_at(max_age_hours, now));
            }
            ShardCommand::Stats { reply } => {
                let _ = reply.send(tracker.stats());
            }
        }
    }

    tracker.clear();
    tracing::debug!("Tracker shard {} stopped", index);
}
