//! Error types surfaced by the worker.

use marquee_core::FetchError;
use thiserror::Error;

/// What [`Orchestrator::handle`](crate::Orchestrator::handle) can fail with.
///
/// Storage problems never show up here: a failed read is a miss and a
/// failed write is a skipped optimization. Only the network can fail a
/// request, and only when nothing usable is cached.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The network failed and there was no cached response to fall back on.
    #[error(transparent)]
    Network(#[from] FetchError),

    /// A navigation found no cached application shell and the network failed too.
    #[error("application shell is not cached and the network is unavailable: {0}")]
    ShellUnavailable(#[source] FetchError),
}

impl From<CacheError> for FetchError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Network(error) | CacheError::ShellUnavailable(error) => error,
        }
    }
}
