//! Proximity tracking spread across single-owner shard tasks.

pub mod shard;

pub use shard::ShardedTracker;
