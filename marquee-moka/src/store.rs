use async_trait::async_trait;
use marquee_backend::{BackendError, BackendResult, DeleteStatus, KeyValueStore};
use marquee_core::StoreLabel;
use moka::future::Cache;

/// Ephemeral string store, the in-process stand-in for session storage.
///
/// Contents live as long as the value and its clones do. With a quota set,
/// a write that would push keys plus values past it is refused with
/// [`BackendError::QuotaExceeded`] and nothing is evicted.
#[derive(Clone, Debug)]
pub struct MokaStore {
    cache: Cache<String, String>,
    label: StoreLabel,
    quota: Option<usize>,
}

impl MokaStore {
    /// Creates a store holding at most `max_keys` keys.
    pub fn new(max_keys: u64) -> Self {
        Self {
            cache: Cache::new(max_keys),
            label: StoreLabel::new_static("session"),
            quota: None,
        }
    }

    /// Limits the stored bytes, counting keys and values.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    fn used_without(&self, key: &str) -> usize {
        self.cache
            .iter()
            .filter(|(stored, _)| stored.as_str() != key)
            .map(|(stored, value)| stored.len() + value.len())
            .sum()
    }

    /// Sets the label used in logs. Defaults to `"session"`.
    pub fn with_label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl KeyValueStore for MokaStore {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: String) -> BackendResult<()> {
        if let Some(quota) = self.quota {
            if self.used_without(key) + key.len() + value.len() > quota {
                return Err(BackendError::QuotaExceeded);
            }
        }
        self.cache.insert(key.to_owned(), value).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }
}
