//! Shared service state.

pub mod store;

pub use store::{AppState, ServiceStats};
