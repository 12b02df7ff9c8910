//! Background task execution.
//!
//! Stale-while-revalidate serves the cached entry right away and refreshes it
//! here. Priority caching also runs here so the message sender never waits.

mod manager;
mod policy;

pub use manager::OffloadManager;
pub use policy::TimeoutPolicy;
