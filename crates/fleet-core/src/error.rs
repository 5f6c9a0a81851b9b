//! Error type for boundary validation in the analytics core.
//!
//! The algorithms themselves are total; these errors only surface when
//! callers hand in malformed input or parameters.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid coordinate for {context}: ({latitude}, {longitude})")]
    InvalidCoordinate {
        context: String,
        latitude: f64,
        longitude: f64,
    },
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },
    #[error("unknown vehicle: {0}")]
    UnknownVehicle(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
