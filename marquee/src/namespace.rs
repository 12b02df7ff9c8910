//! Bounded view over one cache namespace.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use marquee_backend::{Backend, DeleteStatus};
use marquee_core::{CachedResponse, EntryKey, FetchResponse, Freshness};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::metrics;
use crate::strategy::RuntimeCache;

/// A namespace name with its bounds, over a shared backend.
///
/// Storage failures never escape: a failed read is a miss, a failed write
/// is logged and dropped.
#[derive(Clone)]
pub struct Namespace {
    name: SmolStr,
    max_entries: Option<usize>,
    max_age: Option<Duration>,
    backend: Arc<dyn Backend>,
}

impl Namespace {
    /// An unbounded namespace.
    pub fn new(name: impl Into<SmolStr>, backend: Arc<dyn Backend>) -> Self {
        Self {
            name: name.into(),
            max_entries: None,
            max_age: None,
            backend,
        }
    }

    /// The namespace described by `cache` under `prefix`.
    pub fn runtime(prefix: &str, cache: &RuntimeCache, backend: Arc<dyn Backend>) -> Self {
        Self {
            name: cache.namespace(prefix),
            max_entries: cache.max_entries(),
            max_age: cache.max_age(),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of `request_key` inside this namespace.
    pub fn key(&self, request_key: impl Into<SmolStr>) -> EntryKey {
        EntryKey::new(self.name.clone(), request_key)
    }

    /// Returns the stored response if present and unexpired.
    ///
    /// An expired entry is deleted on the way out.
    pub async fn get(&self, request_key: &str) -> Option<FetchResponse> {
        let key = self.key(request_key);
        let entry = match self.backend.read(&key).await {
            Ok(entry) => entry,
            Err(error) => {
                warn!(namespace = %self.name, key = request_key, %error, "namespace read failed");
                None
            }
        };
        let Some(entry) = entry else {
            metrics::record_miss(&self.name);
            return None;
        };
        if entry.freshness(self.max_age, Utc::now()) == Freshness::Expired {
            debug!(namespace = %self.name, key = request_key, "entry expired");
            if let Err(error) = self.backend.remove(&key).await {
                warn!(namespace = %self.name, key = request_key, %error, "expired entry removal failed");
            } else {
                metrics::record_eviction(&self.name, 1);
            }
            metrics::record_miss(&self.name);
            return None;
        }
        metrics::record_hit(&self.name);
        Some(entry.into_response())
    }

    /// Whether a usable entry exists, without touching expired ones.
    pub async fn contains(&self, request_key: &str) -> bool {
        match self.backend.read(&self.key(request_key)).await {
            Ok(Some(entry)) => entry.freshness(self.max_age, Utc::now()) == Freshness::Fresh,
            Ok(None) => false,
            Err(error) => {
                warn!(namespace = %self.name, key = request_key, %error, "namespace read failed");
                false
            }
        }
    }

    /// Stores `response` and evicts the oldest entries past the bound.
    ///
    /// Returns `false` if the write failed.
    pub async fn put(&self, request_key: &str, response: FetchResponse) -> bool {
        let key = self.key(request_key);
        if let Err(error) = self.backend.write(&key, CachedResponse::now(response)).await {
            warn!(namespace = %self.name, key = request_key, %error, "namespace write failed");
            return false;
        }
        self.enforce_max_entries().await;
        true
    }

    async fn enforce_max_entries(&self) {
        let Some(max) = self.max_entries else {
            return;
        };
        let mut entries = match self.backend.entries(&self.name).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(namespace = %self.name, %error, "namespace listing failed");
                return;
            }
        };
        if entries.len() <= max {
            return;
        }
        entries.sort_by(|a, b| a.stored_at.cmp(&b.stored_at).then_with(|| a.key.cmp(&b.key)));
        let excess = entries.len() - max;
        let mut evicted = 0;
        for meta in entries.into_iter().take(excess) {
            match self.backend.remove(&self.key(meta.key)).await {
                Ok(DeleteStatus::Deleted(_)) => evicted += 1,
                Ok(DeleteStatus::Missing) => {}
                Err(error) => warn!(namespace = %self.name, %error, "eviction failed"),
            }
        }
        debug!(namespace = %self.name, evicted, "evicted oldest entries");
        metrics::record_eviction(&self.name, evicted);
    }

    /// Deletes every expired entry. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let Some(max_age) = self.max_age else {
            return 0;
        };
        let entries = match self.backend.entries(&self.name).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(namespace = %self.name, %error, "namespace listing failed");
                return 0;
            }
        };
        let now = Utc::now();
        let mut purged = 0;
        for meta in entries {
            let expired = chrono::TimeDelta::from_std(max_age)
                .ok()
                .and_then(|delta| meta.stored_at.checked_add_signed(delta))
                .is_some_and(|expires_at| expires_at <= now);
            if !expired {
                continue;
            }
            match self.backend.remove(&self.key(meta.key)).await {
                Ok(DeleteStatus::Deleted(_)) => purged += 1,
                Ok(DeleteStatus::Missing) => {}
                Err(error) => warn!(namespace = %self.name, %error, "expired entry removal failed"),
            }
        }
        if purged > 0 {
            metrics::record_eviction(&self.name, purged);
        }
        purged
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("max_entries", &self.max_entries)
            .field("max_age", &self.max_age)
            .field("backend", &self.backend.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use marquee_moka::MokaBackend;

    use super::*;

    fn backend() -> Arc<dyn Backend> {
        Arc::new(MokaBackend::builder().max_entries(1000).build())
    }

    #[tokio::test]
    async fn evicts_oldest_first() {
        let backend = backend();
        let cache = RuntimeCache::new("images", 1).with_max_entries(2);
        let ns = Namespace::runtime("marquee", &cache, backend.clone());
        let base = Utc::now() - TimeDelta::seconds(60);
        for (i, url) in ["a", "b"].iter().enumerate() {
            backend
                .write(
                    &ns.key(*url),
                    CachedResponse::new(FetchResponse::ok(*url), base + TimeDelta::seconds(i as i64)),
                )
                .await
                .unwrap();
        }
        assert!(ns.put("c", FetchResponse::ok("c")).await);
        assert!(!ns.contains("a").await);
        assert!(ns.contains("b").await);
        assert!(ns.contains("c").await);
    }

    #[tokio::test]
    async fn expired_entries_are_misses_and_deleted() {
        let backend = backend();
        let cache = RuntimeCache::new("tmdb-api", 1).with_max_age(Duration::from_secs(10));
        let ns = Namespace::runtime("marquee", &cache, backend.clone());
        let stale = CachedResponse::new(FetchResponse::ok("old"), Utc::now() - TimeDelta::seconds(11));
        backend.write(&ns.key("movie/1"), stale).await.unwrap();

        assert!(ns.get("movie/1").await.is_none());
        assert!(backend.read(&ns.key("movie/1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_expired_keeps_fresh_entries() {
        let backend = backend();
        let cache = RuntimeCache::new("tmdb-api", 1).with_max_age(Duration::from_secs(10));
        let ns = Namespace::runtime("marquee", &cache, backend.clone());
        let stale = CachedResponse::new(FetchResponse::ok("old"), Utc::now() - TimeDelta::seconds(30));
        backend.write(&ns.key("old"), stale).await.unwrap();
        assert!(ns.put("new", FetchResponse::ok("new")).await);

        assert_eq!(ns.purge_expired().await, 1);
        assert_eq!(ns.get("new").await.unwrap().body().as_ref(), b"new");
    }
}
