use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("tracker shard {0} is not running")]
    ShardUnavailable(usize),
    #[error(transparent)]
    Core(#[from] fleet_core::CoreError),
    #[error("analysis task failed: {0}")]
    Analysis(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
