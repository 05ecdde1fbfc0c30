//! Error types shared by the store and the capture flow.

use thiserror::Error;

/// Failures of the photo record store.
///
/// Malformed entries are not represented here: they are recovered during
/// decoding and never reach the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::PersistenceUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::PersistenceUnavailable(err.to_string())
    }
}

/// Failures of the camera and positioning collaborators.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("image unavailable: {0}")]
    ImageUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
