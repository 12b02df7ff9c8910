//! Matchers that carry no request-specific logic of their own.

use std::fmt;

use super::RequestMatcher;
use crate::FetchRequest;

/// Matches every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Any;

impl RequestMatcher for Any {
    fn matches(&self, _request: &FetchRequest) -> bool {
        true
    }
}

/// Adapts a closure into a matcher.
///
/// ```
/// use marquee_core::{FetchRequest, FnMatcher, RequestMatcher};
///
/// let json = FnMatcher::new(|request: &FetchRequest| request.uri().path().ends_with(".json"));
/// assert!(json.matches(&FetchRequest::get("https://cdn.test/home.json".parse()?)));
/// # Ok::<(), http::uri::InvalidUri>(())
/// ```
pub struct FnMatcher<F> {
    f: F,
}

impl<F> FnMatcher<F>
where
    F: Fn(&FetchRequest) -> bool,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMatcher").finish_non_exhaustive()
    }
}

impl<F> RequestMatcher for FnMatcher<F>
where
    F: Fn(&FetchRequest) -> bool,
{
    fn matches(&self, request: &FetchRequest) -> bool {
        (self.f)(request)
    }
}
