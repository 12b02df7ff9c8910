//! YAML configuration for the Marquee interception worker.

pub mod error;
pub mod matcher;
pub mod rule;
mod worker;

pub use error::ConfigError;
pub use matcher::{DestinationConfig, Matcher};
pub use rule::{CacheableConfig, ConfigRule, RuntimeCacheConfig, StrategyConfig};
pub use worker::{ConfigWorker, PrecacheConfig, Worker};
