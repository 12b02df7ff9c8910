#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod fetcher;

pub use fetcher::ReqwestFetcher;

/// Re-export of the client type for convenience in type annotations.
pub use reqwest::Client as ReqwestClient;
