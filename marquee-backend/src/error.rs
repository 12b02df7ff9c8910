//! Error types for backend operations.

use crate::format::FormatError;
use thiserror::Error;

/// Error type for backend operations.
///
/// Callers in the caching layer never surface these to the page: a failed
/// read is a miss and a failed write is a skipped optimization. The variants
/// exist so logs and metrics can tell the causes apart.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to I/O with the storage medium.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// The storage medium could not be reached (disabled storage, closed file).
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] FormatError),

    /// The storage refused the write because it is full.
    #[error("storage quota exceeded")]
    QuotaExceeded,
}

impl BackendError {
    /// Wraps any error as an internal backend error.
    pub fn internal(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InternalError(Box::new(error))
    }
}
