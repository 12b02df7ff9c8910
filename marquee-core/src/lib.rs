#![warn(missing_docs)]
//! # marquee-core
//!
//! Core types for the Marquee offline caching layer.
//!
//! The interception worker, the storage backends and the foreground helpers
//! all speak the vocabulary defined here:
//!
//! - **Requests** the page issues ([`FetchRequest`]) and what they resolve to
//!   ([`FetchResponse`])
//! - **Entries** stored in a cache namespace ([`CachedResponse`], [`EntryKey`])
//! - **Matchers** that route a request to a caching rule ([`RequestMatcher`])
//! - **The network** as an opaque source ([`Fetch`])
//!
//! Nothing in this crate touches storage or spawns tasks.

pub mod fetch;
pub mod key;
pub mod label;
pub mod matcher;
pub mod request;
pub mod response;
pub mod value;

pub use fetch::{Fetch, FetchError};
pub use key::EntryKey;
pub use label::StoreLabel;
pub use matcher::{
    And, Any, BoxMatcher, Destination as DestinationMatcher, FnMatcher, Host, MatcherExt,
    Method as MethodMatcher, Navigation, Not, Or, Path, PathPrefix, RequestMatcher,
};
pub use request::{Credentials, Destination, FetchRequest, RequestMode};
pub use response::{FetchResponse, ResponseType};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use value::{CachedResponse, Freshness};

/// Raw byte data type used for response bodies.
/// Using `Bytes` keeps clones of cached bodies reference counted.
pub type Raw = bytes::Bytes;
