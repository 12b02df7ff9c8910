//! Stored response entries with their storage timestamp.
//!
//! Namespaces do not keep an expiry per entry. They keep the moment the entry
//! was written and the namespace's expiration policy decides, at read time,
//! whether the entry is still servable:
//!
//! - [`Freshness::Fresh`] - younger than the namespace's `max_age`
//! - [`Freshness::Expired`] - older; must not be served
//!
//! ```
//! use chrono::{Duration, Utc};
//! use marquee_core::{CachedResponse, FetchResponse, Freshness};
//!
//! let stored_at = Utc::now() - Duration::days(8);
//! let entry = CachedResponse::new(FetchResponse::ok("{}"), stored_at);
//!
//! let week = std::time::Duration::from_secs(7 * 24 * 60 * 60);
//! assert_eq!(entry.freshness(Some(week), Utc::now()), Freshness::Expired);
//! assert_eq!(entry.freshness(None, Utc::now()), Freshness::Fresh);
//! ```

use std::mem::size_of;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::FetchResponse;

/// Whether a stored entry may still be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within the namespace's age bound.
    Fresh,
    /// Past the namespace's age bound.
    Expired,
}

/// A response as kept inside a cache namespace.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    response: FetchResponse,
    stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Wraps a response stored at the given time.
    pub fn new(response: FetchResponse, stored_at: DateTime<Utc>) -> Self {
        Self {
            response,
            stored_at,
        }
    }

    /// Wraps a response stored right now.
    pub fn now(response: FetchResponse) -> Self {
        Self::new(response, Utc::now())
    }

    /// The stored response.
    #[inline]
    pub fn response(&self) -> &FetchResponse {
        &self.response
    }

    /// When the entry was written.
    #[inline]
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Consumes the entry and returns the response.
    pub fn into_response(self) -> FetchResponse {
        self.response
    }

    /// Time elapsed since the entry was written, zero if `now` is earlier.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Evaluates the entry against an optional age bound.
    ///
    /// `None` means the namespace never expires entries by age.
    pub fn freshness(&self, max_age: Option<Duration>, now: DateTime<Utc>) -> Freshness {
        let Some(max_age) = max_age else {
            return Freshness::Fresh;
        };
        let expires_at = TimeDelta::from_std(max_age)
            .ok()
            .and_then(|delta| self.stored_at.checked_add_signed(delta));
        match expires_at {
            Some(expires_at) if expires_at <= now => Freshness::Expired,
            _ => Freshness::Fresh,
        }
    }

    /// Estimated memory usage of this entry in bytes.
    ///
    /// Counts the struct itself, the body and the header bytes.
    pub fn memory_size(&self) -> usize {
        let headers: usize = self
            .response
            .headers()
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        size_of::<Self>() + self.response.body().len() + headers
    }
}
