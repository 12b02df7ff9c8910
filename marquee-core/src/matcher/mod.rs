//! Request matchers for the strategy table.
//!
//! A [`RequestMatcher`] answers one question: does this rule apply to this
//! request? Matchers are synchronous and side-effect free so the routing step
//! can be unit tested without a worker runtime.
//!
//! ## Composability
//!
//! Matchers compose with [`MatcherExt`]:
//!
//! ```
//! use marquee_core::{Destination, FetchRequest, Host, MatcherExt, RequestMatcher};
//! use marquee_core::DestinationMatcher;
//!
//! let images = DestinationMatcher::new(Destination::Image).or(Host::new("image.tmdb.org"));
//!
//! let poster = FetchRequest::get("https://image.tmdb.org/t/p/w500/a.jpg".parse()?);
//! assert!(images.matches(&poster));
//! # Ok::<(), http::uri::InvalidUri>(())
//! ```

pub mod combinators;
pub mod neutral;
pub mod request;

use std::sync::Arc;

pub use combinators::{And, MatcherExt, Not, Or};
pub use neutral::{Any, FnMatcher};
pub use request::{Destination, Host, Method, Navigation, Path, PathPrefix};

use crate::FetchRequest;

/// Decides whether a rule applies to a request.
pub trait RequestMatcher {
    /// Returns `true` when the request matches.
    fn matches(&self, request: &FetchRequest) -> bool;
}

/// Boxed matcher for dynamic dispatch.
pub type BoxMatcher = Box<dyn RequestMatcher + Send + Sync>;

impl<T> RequestMatcher for Box<T>
where
    T: RequestMatcher + ?Sized,
{
    fn matches(&self, request: &FetchRequest) -> bool {
        self.as_ref().matches(request)
    }
}

impl<T> RequestMatcher for &T
where
    T: RequestMatcher + ?Sized,
{
    fn matches(&self, request: &FetchRequest) -> bool {
        (*self).matches(request)
    }
}

impl<T> RequestMatcher for Arc<T>
where
    T: RequestMatcher + ?Sized,
{
    fn matches(&self, request: &FetchRequest) -> bool {
        self.as_ref().matches(request)
    }
}
