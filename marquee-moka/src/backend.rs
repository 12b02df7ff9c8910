//! Moka backend implementation.

use std::collections::BTreeSet;

use async_trait::async_trait;
use marquee_backend::{Backend, BackendResult, DeleteStatus, EntryMeta};
use marquee_core::{CachedResponse, EntryKey, StoreLabel};
use moka::future::Cache;
use smol_str::SmolStr;
use tracing::debug;

use crate::builder::{MokaBackendBuilder, NoCapacity};

/// In-memory cache namespaces powered by Moka.
///
/// All namespaces share one Moka cache keyed by [`EntryKey`]. Values are kept
/// as [`CachedResponse`] without serialization; cloning one only bumps the
/// body's reference count.
///
/// Listing a namespace walks the whole cache. The worker does that on
/// eviction and activation only, never on the read path.
#[derive(Clone)]
pub struct MokaBackend {
    cache: Cache<EntryKey, CachedResponse>,
    label: StoreLabel,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaBackend {
    /// Creates a new builder for `MokaBackend`.
    pub fn builder() -> MokaBackendBuilder<NoCapacity> {
        MokaBackendBuilder::new()
    }

    pub(crate) fn from_cache(cache: Cache<EntryKey, CachedResponse>, label: StoreLabel) -> Self {
        Self { cache, label }
    }

    /// The underlying Moka cache.
    pub fn cache(&self) -> &Cache<EntryKey, CachedResponse> {
        &self.cache
    }

    fn keys_in(&self, namespace: &str) -> Vec<EntryKey> {
        self.cache
            .iter()
            .filter(|(key, _)| key.namespace() == namespace)
            .map(|(key, _)| EntryKey::clone(&key))
            .collect()
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &EntryKey) -> BackendResult<Option<CachedResponse>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(&self, key: &EntryKey, value: CachedResponse) -> BackendResult<()> {
        self.cache.insert(key.clone(), value).await;
        crate::metrics::record_capacity(
            self.label.as_str(),
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
        Ok(())
    }

    async fn remove(&self, key: &EntryKey) -> BackendResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn entries(&self, namespace: &str) -> BackendResult<Vec<EntryMeta>> {
        Ok(self
            .cache
            .iter()
            .filter(|(key, _)| key.namespace() == namespace)
            .map(|(key, value)| EntryMeta {
                key: SmolStr::new(key.request()),
                stored_at: value.stored_at(),
            })
            .collect())
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        let names: BTreeSet<SmolStr> = self
            .cache
            .iter()
            .map(|(key, _)| SmolStr::new(key.namespace()))
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn drop_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        let keys = self.keys_in(namespace);
        if keys.is_empty() {
            return Ok(DeleteStatus::Missing);
        }
        let mut deleted = 0u32;
        for key in keys {
            if self.cache.remove(&key).await.is_some() {
                deleted += 1;
            }
        }
        debug!(backend = %self.label, namespace, deleted, "dropped namespace");
        Ok(match deleted {
            0 => DeleteStatus::Missing,
            n => DeleteStatus::Deleted(n),
        })
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }
}
