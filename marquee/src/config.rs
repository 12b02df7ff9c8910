//! Worker settings.

use std::time::Duration;

use bounded_integer::bounded_integer;
use http::Uri;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::offload::TimeoutPolicy;
use crate::strategy::RuntimeCache;

bounded_integer! {
    /// Number of precache assets fetched at once during install (1-64).
    #[repr(u8)]
    pub struct PrecacheConcurrency { 1..=64 }
}

impl Default for PrecacheConcurrency {
    fn default() -> Self {
        Self::new_saturating(8)
    }
}

/// Settings of the durable namespace filled by priority cache requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PriorityConfig {
    /// URLs taken from one request; the rest are dropped.
    pub max_urls: usize,
    /// Namespace version. Bump it to retire every stored entry.
    pub version: u32,
    /// Entry bound of the namespace, unbounded when unset.
    pub max_entries: Option<usize>,
    /// Age bound of the namespace (e.g. "30d"), unbounded when unset.
    #[serde(with = "humantime_serde")]
    pub max_age: Option<Duration>,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            max_urls: 50,
            version: 1,
            max_entries: None,
            max_age: None,
        }
    }
}

impl PriorityConfig {
    /// The runtime cache description of the priority namespace.
    pub fn runtime_cache(&self) -> RuntimeCache {
        RuntimeCache::new("priority", self.version)
            .with_max_entries(self.max_entries)
            .with_max_age(self.max_age)
    }
}

/// Settings of the interception worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Prefix of every namespace the worker owns. Activation never touches
    /// namespaces without it.
    pub prefix: SmolStr,
    /// Origin (and optional base path) relative URLs resolve against.
    pub scope: Option<String>,
    /// Parallel fetches during install.
    pub precache_concurrency: PrecacheConcurrency,
    /// Timeout policy of background revalidation and priority caching.
    pub offload: TimeoutPolicy,
    /// Priority namespace settings.
    pub priority: PriorityConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            prefix: SmolStr::new_static("marquee"),
            scope: None,
            precache_concurrency: PrecacheConcurrency::default(),
            offload: TimeoutPolicy::default(),
            priority: PriorityConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Sets the namespace prefix.
    pub fn with_prefix(mut self, prefix: impl Into<SmolStr>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the scope relative URLs resolve against.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Resolves `url` against the scope.
    ///
    /// Absolute URLs are returned as parsed. Relative URLs are joined with
    /// the scope, or kept relative when no scope is set. Returns `None` for
    /// anything that does not parse.
    pub fn resolve(&self, url: &str) -> Option<Uri> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        let parsed: Uri = url.parse().ok()?;
        if parsed.scheme().is_some() {
            return Some(parsed);
        }
        let Some(scope) = self.scope.as_deref() else {
            return Some(parsed);
        };
        let scope: Uri = scope.parse().ok()?;
        let (Some(scheme), Some(authority)) = (scope.scheme(), scope.authority()) else {
            return Some(parsed);
        };
        let joined = if url.starts_with('/') {
            format!("{scheme}://{authority}{url}")
        } else {
            let base = scope.path();
            let dir = &base[..base.rfind('/').map_or(0, |i| i + 1)];
            let dir = if dir.is_empty() { "/" } else { dir };
            format!("{scheme}://{authority}{dir}{url}")
        };
        joined.parse().ok()
    }
}
