use std::sync::Arc;

use async_trait::async_trait;
use feoxdb::{FeoxError, FeoxStore};
use marquee_backend::{BackendError, BackendResult, DeleteStatus, KeyValueStore};
use marquee_core::StoreLabel;

use crate::FeOxDbError;
use crate::index::value_key;

/// Persistent string store, the on-disk stand-in for local storage.
///
/// Obtain one sharing a backend's database with
/// [`FeOxDbBackend::store`](crate::FeOxDbBackend::store), or open a
/// memory-only one for tests.
#[derive(Clone)]
pub struct FeOxDbStore {
    store: Arc<FeoxStore>,
    label: StoreLabel,
}

impl std::fmt::Debug for FeOxDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbStore")
            .field("label", &self.label)
            .finish()
    }
}

impl FeOxDbStore {
    pub(crate) fn from_shared(store: Arc<FeoxStore>) -> Self {
        Self {
            store,
            label: StoreLabel::new_static("local"),
        }
    }

    /// Memory-only store.
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        let store = FeoxStore::builder().build()?;
        Ok(Self::from_shared(Arc::new(store)))
    }

    /// Sets the label used in logs. Defaults to `"local"`.
    pub fn with_label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl KeyValueStore for FeOxDbStore {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let store = self.store.clone();
        let key = value_key(key);
        tokio::task::spawn_blocking(move || -> BackendResult<Option<String>> {
            match store.get(&key) {
                Ok(bytes) => String::from_utf8(bytes)
                    .map(Some)
                    .map_err(BackendError::internal),
                Err(FeoxError::KeyNotFound) => Ok(None),
                Err(err) => Err(BackendError::internal(err)),
            }
        })
        .await
        .map_err(BackendError::internal)?
    }

    async fn set(&self, key: &str, value: String) -> BackendResult<()> {
        let store = self.store.clone();
        let key = value_key(key);
        tokio::task::spawn_blocking(move || -> BackendResult<()> {
            store
                .insert(&key, value.as_bytes())
                .map_err(BackendError::internal)?;
            Ok(())
        })
        .await
        .map_err(BackendError::internal)?
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        let store = self.store.clone();
        let key = value_key(key);
        tokio::task::spawn_blocking(move || -> BackendResult<DeleteStatus> {
            if !store.contains_key(&key) {
                return Ok(DeleteStatus::Missing);
            }
            store.delete(&key).map_err(BackendError::internal)?;
            Ok(DeleteStatus::Deleted(1))
        })
        .await
        .map_err(BackendError::internal)?
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }
}
