use std::collections::HashSet;
use std::time::Duration;

use marquee::offload::TimeoutPolicy;
use marquee::strategy::StrategyTable;
use marquee::{PrecacheConcurrency, PrecacheManifest, PriorityConfig, WorkerConfig};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ConfigError;
use crate::matcher::{DestinationConfig, Matcher};
use crate::rule::{CacheableConfig, ConfigRule, RuntimeCacheConfig, StrategyConfig};

const DAY: u64 = 24 * 60 * 60;

fn default_prefix() -> SmolStr {
    SmolStr::new_static("marquee")
}

fn default_offload() -> TimeoutPolicy {
    TimeoutPolicy::Cancel {
        after: Duration::from_secs(30),
    }
}

fn default_shell() -> String {
    "/index.html".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheConfig {
    pub revision: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            revision: "dev".to_owned(),
            urls: Vec::new(),
        }
    }
}

/// The whole worker as written in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWorker {
    /// Origin relative URLs resolve against. Must be absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: SmolStr,
    /// Document served to every navigation.
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub precache: PrecacheConfig,
    #[serde(default)]
    pub precache_concurrency: PrecacheConcurrency,
    /// Background task policy, `{ mode: cancel, after: 30s }` by default.
    #[serde(default = "default_offload")]
    pub offload: TimeoutPolicy,
    #[serde(default)]
    pub priority: PriorityConfig,
    #[serde(default)]
    pub rules: Vec<ConfigRule>,
}

/// What [`ConfigWorker::into_worker`] produces.
#[derive(Debug)]
pub struct Worker {
    pub table: StrategyTable,
    pub manifest: PrecacheManifest,
    pub config: WorkerConfig,
}

impl ConfigWorker {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    pub fn into_worker(self) -> Result<Worker, ConfigError> {
        if let Some(scope) = &self.scope {
            let uri: http::Uri = scope
                .parse()
                .map_err(|_| ConfigError::InvalidScope(scope.clone()))?;
            if uri.scheme().is_none() || uri.authority().is_none() {
                return Err(ConfigError::InvalidScope(scope.clone()));
            }
        }

        let mut names = HashSet::new();
        let mut table = StrategyTable::builder().app_shell(self.shell);
        for rule in self.rules {
            if !names.insert(rule.name.clone()) {
                return Err(ConfigError::DuplicateRule(rule.name));
            }
            table = table.rule(rule.into_rule()?);
        }

        let config = WorkerConfig {
            prefix: self.prefix,
            scope: self.scope,
            precache_concurrency: self.precache_concurrency,
            offload: self.offload,
            priority: self.priority,
        };
        Ok(Worker {
            table: table.build(),
            manifest: PrecacheManifest::new(self.precache.revision, self.precache.urls),
            config,
        })
    }
}

impl Default for ConfigWorker {
    /// The media browser's table: metadata API and backend data revalidate
    /// in the background, images are served cache-first.
    fn default() -> Self {
        Self {
            scope: None,
            prefix: default_prefix(),
            shell: default_shell(),
            precache: PrecacheConfig::default(),
            precache_concurrency: PrecacheConcurrency::default(),
            offload: default_offload(),
            priority: PriorityConfig::default(),
            rules: vec![
                ConfigRule {
                    name: "metadata".to_owned(),
                    matcher: Matcher::Host("api.themoviedb.org".to_owned()),
                    strategy: StrategyConfig::StaleWhileRevalidate(RuntimeCacheConfig {
                        cache: "tmdb-api".to_owned(),
                        version: 1,
                        max_entries: Some(500),
                        max_age: Some(Duration::from_secs(7 * DAY)),
                    }),
                    cacheable: CacheableConfig::default(),
                },
                ConfigRule {
                    name: "backend".to_owned(),
                    matcher: Matcher::Host("*.supabase.co".to_owned()),
                    strategy: StrategyConfig::StaleWhileRevalidate(RuntimeCacheConfig {
                        cache: "supabase-data".to_owned(),
                        version: 1,
                        max_entries: Some(200),
                        max_age: Some(Duration::from_secs(14 * DAY)),
                    }),
                    cacheable: CacheableConfig::default(),
                },
                ConfigRule {
                    name: "images".to_owned(),
                    matcher: Matcher::Or(vec![
                        Matcher::Destination(DestinationConfig::Image),
                        Matcher::Host("image.tmdb.org".to_owned()),
                    ]),
                    strategy: StrategyConfig::CacheFirst(RuntimeCacheConfig {
                        cache: "images".to_owned(),
                        version: 1,
                        max_entries: Some(1500),
                        max_age: Some(Duration::from_secs(30 * DAY)),
                    }),
                    cacheable: CacheableConfig {
                        statuses: vec![200],
                        opaque: true,
                    },
                },
            ],
        }
    }
}
