//! Error types for region resolution and trajectory queries.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the query engine.
///
/// Empty answers (a point outside every region, a circle with no points) are
/// not errors; they come back as empty results.
#[derive(Debug, Error)]
pub enum GeoLocateError {
    /// Caller supplied an out-of-range coordinate, a non-positive radius, a
    /// malformed time window or a similar bad argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A region record cannot be turned into an indexable polygon.
    #[error("Malformed region {region_id}: {reason}")]
    DataError { region_id: u64, reason: String },

    /// The configured query deadline expired between pipeline stages.
    #[error("Query deadline exceeded after {elapsed:?} during {stage}")]
    DeadlineExceeded {
        stage: &'static str,
        elapsed: Duration,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeoLocateError {
    pub(crate) fn data(region_id: u64, reason: impl Into<String>) -> Self {
        GeoLocateError::DataError {
            region_id,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoLocateError>;
