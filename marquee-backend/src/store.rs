use std::sync::Arc;

use async_trait::async_trait;
use marquee_core::StoreLabel;

use crate::{BackendResult, DeleteStatus};

/// String key-value storage backing one foreground storage tier.
///
/// Mirrors what a browser offers as session and local storage: flat string
/// keys, string values, single-key atomic writes, no transactions.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> BackendResult<()>;

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus>;

    /// Returns the label of this store for logs.
    fn label(&self) -> StoreLabel {
        StoreLabel::new_static("store")
    }
}

#[async_trait]
impl<T> KeyValueStore for Arc<T>
where
    T: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> BackendResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }
}

#[async_trait]
impl<T> KeyValueStore for Box<T>
where
    T: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> BackendResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }
}
