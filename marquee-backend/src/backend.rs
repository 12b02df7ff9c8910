use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::{CachedResponse, EntryKey, StoreLabel};
use smol_str::SmolStr;

use crate::{BackendError, DeleteStatus};

pub type BackendResult<T> = Result<T, BackendError>;

/// Bookkeeping view of one entry, used for eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Request key inside the namespace.
    pub key: SmolStr,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

/// Storage for named cache namespaces.
///
/// A namespace springs into existence on its first write and lives until
/// [`drop_namespace`](Backend::drop_namespace) removes it. Backends store
/// entries as given; expiration and eviction are decided by the caller.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn read(&self, key: &EntryKey) -> BackendResult<Option<CachedResponse>>;

    async fn write(&self, key: &EntryKey, value: CachedResponse) -> BackendResult<()>;

    async fn remove(&self, key: &EntryKey) -> BackendResult<DeleteStatus>;

    /// Lists every entry of `namespace`. Unknown namespaces are empty.
    async fn entries(&self, namespace: &str) -> BackendResult<Vec<EntryMeta>>;

    /// Lists every namespace holding at least one write.
    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>>;

    /// Removes a namespace with all of its entries.
    async fn drop_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus>;

    async fn contains(&self, key: &EntryKey) -> BackendResult<bool> {
        Ok(self.read(key).await?.is_some())
    }

    /// Returns the label of this backend for logs and metrics.
    fn label(&self) -> StoreLabel {
        StoreLabel::new_static("backend")
    }
}

#[async_trait]
impl<T> Backend for &T
where
    T: Backend + ?Sized,
{
    async fn read(&self, key: &EntryKey) -> BackendResult<Option<CachedResponse>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &EntryKey, value: CachedResponse) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &EntryKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn entries(&self, namespace: &str) -> BackendResult<Vec<EntryMeta>> {
        (**self).entries(namespace).await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        (**self).namespaces().await
    }

    async fn drop_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        (**self).drop_namespace(namespace).await
    }

    async fn contains(&self, key: &EntryKey) -> BackendResult<bool> {
        (**self).contains(key).await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }
}

#[async_trait]
impl<T> Backend for Box<T>
where
    T: Backend + ?Sized,
{
    async fn read(&self, key: &EntryKey) -> BackendResult<Option<CachedResponse>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &EntryKey, value: CachedResponse) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &EntryKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn entries(&self, namespace: &str) -> BackendResult<Vec<EntryMeta>> {
        (**self).entries(namespace).await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        (**self).namespaces().await
    }

    async fn drop_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        (**self).drop_namespace(namespace).await
    }

    async fn contains(&self, key: &EntryKey) -> BackendResult<bool> {
        (**self).contains(key).await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }
}

#[async_trait]
impl<T> Backend for Arc<T>
where
    T: Backend + ?Sized,
{
    async fn read(&self, key: &EntryKey) -> BackendResult<Option<CachedResponse>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &EntryKey, value: CachedResponse) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &EntryKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn entries(&self, namespace: &str) -> BackendResult<Vec<EntryMeta>> {
        (**self).entries(namespace).await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        (**self).namespaces().await
    }

    async fn drop_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        (**self).drop_namespace(namespace).await
    }

    async fn contains(&self, key: &EntryKey) -> BackendResult<bool> {
        (**self).contains(key).await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }
}
