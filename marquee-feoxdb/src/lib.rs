#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod backend;
mod error;
mod index;
mod store;

pub use backend::{FeOxDbBackend, FeOxDbBackendBuilder};
pub use error::FeOxDbError;
pub use store::FeOxDbStore;
