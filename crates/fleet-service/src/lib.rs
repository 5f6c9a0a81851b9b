//! Fleet analytics runtime: sharded proximity tracking, alert buffering with
//! periodic hotspot refresh, and history retention.

pub mod config;
pub mod error;
pub mod events;
pub mod loops;
pub mod state;
pub mod tracking;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
