//! The network as an opaque source.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{FetchRequest, FetchResponse};

/// Failure to obtain any response at all.
///
/// HTTP error statuses are not errors: they arrive as a [`FetchResponse`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection reset, TLS, ...).
    #[error("network error: {0}")]
    Network(Box<dyn std::error::Error + Send + Sync>),
    /// The network is known to be unreachable.
    #[error("network unavailable")]
    Offline,
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
    /// The URL could not be turned into a request.
    #[error("invalid url `{url}`")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },
}

impl FetchError {
    /// Wraps any transport error.
    pub fn network(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network(Box::new(error))
    }
}

/// Something that turns a request into a response.
///
/// The network client implements this, and so does the interception
/// orchestrator, which lets foreground code go through the cache without
/// knowing about it.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use marquee_core::{Fetch, FetchError, FetchRequest, FetchResponse};
///
/// struct Offline;
///
/// #[async_trait]
/// impl Fetch for Offline {
///     async fn fetch(&self, _request: FetchRequest) -> Result<FetchResponse, FetchError> {
///         Err(FetchError::Offline)
///     }
/// }
/// ```
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Performs the request.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<T> Fetch for &T
where
    T: Fetch + ?Sized,
{
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Fetch for Box<T>
where
    T: Fetch + ?Sized,
{
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Fetch for Arc<T>
where
    T: Fetch + ?Sized,
{
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        (**self).fetch(request).await
    }
}
