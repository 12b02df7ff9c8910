//! Logical combinators for composing matchers.
//!
//! ```ignore
//! use marquee_core::matcher::{MatcherExt, Navigation, PathPrefix};
//!
//! let api_navigation = Navigation.and(PathPrefix::new("/api/"));
//! let not_api = PathPrefix::new("/api/").not();
//! ```

use super::{BoxMatcher, RequestMatcher};
use crate::FetchRequest;

/// Inverts a matcher.
#[derive(Debug)]
pub struct Not<M> {
    matcher: M,
}

impl<M> Not<M> {
    /// Creates a new `Not` combinator wrapping the given matcher.
    pub fn new(matcher: M) -> Self {
        Self { matcher }
    }
}

impl<M> RequestMatcher for Not<M>
where
    M: RequestMatcher,
{
    fn matches(&self, request: &FetchRequest) -> bool {
        !self.matcher.matches(request)
    }
}

/// Requires both matchers to match.
///
/// Short-circuits: if the left matcher fails, the right one is not evaluated.
#[derive(Debug)]
pub struct And<L, R> {
    left: L,
    right: R,
}

impl<L, R> And<L, R> {
    /// Creates a new `And` combinator from two matchers.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L, R> RequestMatcher for And<L, R>
where
    L: RequestMatcher,
    R: RequestMatcher,
{
    fn matches(&self, request: &FetchRequest) -> bool {
        self.left.matches(request) && self.right.matches(request)
    }
}

/// Requires either matcher to match.
///
/// Short-circuits: if the left matcher matches, the right one is not evaluated.
#[derive(Debug)]
pub struct Or<L, R> {
    left: L,
    right: R,
}

impl<L, R> Or<L, R> {
    /// Creates a new `Or` combinator from two matchers.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L, R> RequestMatcher for Or<L, R>
where
    L: RequestMatcher,
    R: RequestMatcher,
{
    fn matches(&self, request: &FetchRequest) -> bool {
        self.left.matches(request) || self.right.matches(request)
    }
}

/// Extension trait for fluent matcher composition.
///
/// Implemented for every [`RequestMatcher`].
pub trait MatcherExt: RequestMatcher + Sized {
    /// Both `self` and `other` must match.
    fn and<R: RequestMatcher>(self, other: R) -> And<Self, R> {
        And::new(self, other)
    }

    /// Either `self` or `other` must match.
    fn or<R: RequestMatcher>(self, other: R) -> Or<Self, R> {
        Or::new(self, other)
    }

    /// Inverts `self`.
    fn not(self) -> Not<Self> {
        Not::new(self)
    }

    /// Boxes `self` for storage in a rule table.
    fn boxed(self) -> BoxMatcher
    where
        Self: Send + Sync + 'static,
    {
        Box::new(self)
    }
}

impl<M> MatcherExt for M where M: RequestMatcher {}
