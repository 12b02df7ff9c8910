//! Traits and structs for Marquee storage interaction.
//!
//! If you want to back the worker's cache namespaces or the foreground
//! storage tiers with your own storage, you are in the right place.
mod backend;
pub mod error;
pub mod format;
mod store;

pub use backend::{Backend, BackendResult, EntryMeta};
pub use error::BackendError;
pub use format::{BincodeFormat, Format, FormatError, JsonFormat};
pub use store::KeyValueStore;

/// Status of deleting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Records successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
