use feoxdb::FeoxError;
use thiserror::Error;

/// Errors raised while opening a FeOxDB database.
///
/// Operations on an open backend report [`BackendError`](marquee_backend::BackendError)
/// instead.
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// An error from the underlying FeOxDB database.
    #[error("FeOxDB error: {0}")]
    FeOxDb(#[from] FeoxError),

    /// An I/O error occurred while preparing the database path.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
