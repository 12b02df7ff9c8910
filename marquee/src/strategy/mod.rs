//! The cache strategy table.
//!
//! An ordered list of rules built once and handed to the orchestrator.
//! Navigations always route to the application shell; every other request
//! goes to the first rule whose matcher accepts it.

mod cacheable;
mod table;

use std::time::Duration;

use smol_str::SmolStr;

pub use cacheable::CacheableResponse;
pub use table::{AppShell, NoShell, Route, Rule, StrategyTable, StrategyTableBuilder};

/// A runtime namespace and its bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCache {
    name: SmolStr,
    version: u32,
    max_entries: Option<usize>,
    max_age: Option<Duration>,
}

impl RuntimeCache {
    /// A namespace called `name` at `version` with no bounds.
    pub fn new(name: impl Into<SmolStr>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            max_entries: None,
            max_age: None,
        }
    }

    /// Evicts the oldest entries once the namespace holds more than `max`.
    pub fn with_max_entries(mut self, max: impl Into<Option<usize>>) -> Self {
        self.max_entries = max.into();
        self
    }

    /// Never serves entries older than `max_age`.
    pub fn with_max_age(mut self, max_age: impl Into<Option<Duration>>) -> Self {
        self.max_age = max_age.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Physical namespace name: `{prefix}-{name}-v{version}`.
    pub fn namespace(&self, prefix: &str) -> SmolStr {
        SmolStr::new(format!("{prefix}-{}-v{}", self.name, self.version))
    }
}

/// How a matched request is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Cache, then network on a miss.
    CacheFirst(RuntimeCache),
    /// Cache with a background refresh, network on a miss.
    StaleWhileRevalidate(RuntimeCache),
    /// Always the network, nothing stored.
    NetworkOnly,
}

impl Strategy {
    /// The runtime namespace this strategy reads and writes, if any.
    pub fn runtime_cache(&self) -> Option<&RuntimeCache> {
        match self {
            Self::CacheFirst(cache) | Self::StaleWhileRevalidate(cache) => Some(cache),
            Self::NetworkOnly => None,
        }
    }

    /// Short name for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CacheFirst(_) => "cache_first",
            Self::StaleWhileRevalidate(_) => "stale_while_revalidate",
            Self::NetworkOnly => "network_only",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_name_is_versioned() {
        let images = RuntimeCache::new("images", 3).with_max_entries(1500);
        assert_eq!(images.namespace("marquee"), "marquee-images-v3");
        assert_eq!(images.max_entries(), Some(1500));
        assert_eq!(images.max_age(), None);
    }
}
