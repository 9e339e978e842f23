//! Error types.

use crate::constraint::ToolId;
use crate::grid::ParseCoordError;
use thiserror::Error;

/// Errors raised while loading or mutating constraint data.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Coordinate(#[from] ParseCoordError),
    #[error("invalid `{tool}` constraint #{index}: {reason}")]
    Geometry {
        tool: ToolId,
        index: usize,
        reason: String,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while loading an editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
