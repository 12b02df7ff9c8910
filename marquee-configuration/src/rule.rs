//! Rule and strategy configuration.

use std::time::Duration;

use marquee::strategy::{CacheableResponse, Rule, RuntimeCache, Strategy};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matcher::Matcher;

fn default_version() -> u32 {
    1
}

/// A runtime namespace and its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeCacheConfig {
    /// Namespace class, e.g. `images`.
    pub cache: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    /// Age bound such as "7d" or "12h".
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub max_age: Option<Duration>,
}

impl RuntimeCacheConfig {
    fn into_runtime_cache(self, rule: &str) -> Result<RuntimeCache, ConfigError> {
        if self.max_entries == Some(0) {
            return Err(ConfigError::InvalidBound {
                rule: rule.to_owned(),
                reason: "max_entries must be at least 1",
            });
        }
        if self.max_age == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidBound {
                rule: rule.to_owned(),
                reason: "max_age must be positive",
            });
        }
        Ok(RuntimeCache::new(self.cache, self.version)
            .with_max_entries(self.max_entries)
            .with_max_age(self.max_age))
    }
}

// YAML syntax: CacheFirst: {...}, StaleWhileRevalidate: {...}, NetworkOnly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyConfig {
    CacheFirst(RuntimeCacheConfig),
    StaleWhileRevalidate(RuntimeCacheConfig),
    NetworkOnly,
}

fn default_statuses() -> Vec<u16> {
    vec![200]
}

/// Which responses a rule stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheableConfig {
    #[serde(default = "default_statuses")]
    pub statuses: Vec<u16>,
    /// Also store opaque cross-origin responses.
    #[serde(default)]
    pub opaque: bool,
}

impl Default for CacheableConfig {
    fn default() -> Self {
        Self {
            statuses: default_statuses(),
            opaque: false,
        }
    }
}

impl From<CacheableConfig> for CacheableResponse {
    fn from(config: CacheableConfig) -> Self {
        let cacheable = CacheableResponse::statuses(config.statuses);
        if config.opaque {
            cacheable.with_opaque()
        } else {
            cacheable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRule {
    pub name: String,
    #[serde(rename = "match")]
    pub matcher: Matcher,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub cacheable: CacheableConfig,
}

impl ConfigRule {
    pub fn into_rule(self) -> Result<Rule, ConfigError> {
        let strategy = match self.strategy {
            StrategyConfig::CacheFirst(cache) => {
                Strategy::CacheFirst(cache.into_runtime_cache(&self.name)?)
            }
            StrategyConfig::StaleWhileRevalidate(cache) => {
                Strategy::StaleWhileRevalidate(cache.into_runtime_cache(&self.name)?)
            }
            StrategyConfig::NetworkOnly => Strategy::NetworkOnly,
        };
        let matcher = self.matcher.into_matcher()?;
        Ok(Rule::new(self.name, matcher, strategy).cacheable(self.cacheable.into()))
    }
}
