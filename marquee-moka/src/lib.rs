#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod backend;
mod builder;
pub mod metrics;
mod store;

pub use backend::MokaBackend;
pub use builder::{ByteCapacity, EntryCapacity, MokaBackendBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
pub use store::MokaStore;
