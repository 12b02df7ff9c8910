use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use feoxdb::{FeoxError, FeoxStore};
use marquee_backend::{
    Backend, BackendError, BackendResult, BincodeFormat, DeleteStatus, EntryMeta, Format,
};
use marquee_core::{CachedResponse, EntryKey, StoreLabel};
use smol_str::SmolStr;
use tokio::sync::Mutex;
use tracing::debug;

use crate::index::{self, entry_key};
use crate::{FeOxDbError, FeOxDbStore};

/// Disk-based cache namespaces on FeOxDB.
///
/// Entries survive restarts. Namespace indexes are updated under a single
/// lock, so concurrent writers never lose each other's index entries.
///
/// ```no_run
/// use marquee_feoxdb::FeOxDbBackend;
///
/// let backend = FeOxDbBackend::builder()
///     .path("/var/lib/marquee")
///     .max_file_size(512 * 1024 * 1024)
///     .build()?;
/// # Ok::<(), marquee_feoxdb::FeOxDbError>(())
/// ```
///
/// Cloning is cheap. Clones share the same underlying database.
#[derive(Clone)]
pub struct FeOxDbBackend<S = BincodeFormat>
where
    S: Format,
{
    store: Arc<FeoxStore>,
    index_lock: Arc<Mutex<()>>,
    serializer: S,
    label: StoreLabel,
}

impl<S: Format> std::fmt::Debug for FeOxDbBackend<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbBackend")
            .field("label", &self.label)
            .field("serializer", &self.serializer)
            .finish()
    }
}

impl<S: Format> FeOxDbBackend<S> {
    /// Forces pending writes to disk.
    ///
    /// FeOxDB buffers writes and flushes them periodically. No-op in
    /// memory-only mode.
    pub fn flush(&self) {
        self.store.flush();
    }

    /// A string key-value store sharing this database.
    pub fn store(&self) -> FeOxDbStore {
        FeOxDbStore::from_shared(self.store.clone())
    }
}

impl FeOxDbBackend<BincodeFormat> {
    /// Starts building a new backend.
    pub fn builder() -> FeOxDbBackendBuilder<BincodeFormat> {
        FeOxDbBackendBuilder::default()
    }

    /// Memory-only backend, handy in tests.
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }
}

/// Builder for [`FeOxDbBackend`].
#[derive(Debug)]
pub struct FeOxDbBackendBuilder<S = BincodeFormat>
where
    S: Format,
{
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    serializer: S,
    label: StoreLabel,
}

impl Default for FeOxDbBackendBuilder<BincodeFormat> {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            serializer: BincodeFormat,
            label: StoreLabel::new_static("feoxdb"),
        }
    }
}

impl<S: Format> FeOxDbBackendBuilder<S> {
    /// Enables persistent storage at the given path.
    ///
    /// If path is a directory, `marquee.db` is created inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocates disk space and caps maximum storage.
    ///
    /// Writes fail once the file is full; the worker treats that as a
    /// skipped cache write.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM used for the read cache, or for everything in memory-only mode.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Identifies this backend in logs and metrics.
    pub fn label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Value serialization format. Defaults to [`BincodeFormat`].
    pub fn value_format<NewS: Format>(self, serializer: NewS) -> FeOxDbBackendBuilder<NewS> {
        FeOxDbBackendBuilder {
            path: self.path,
            max_file_size: self.max_file_size,
            max_memory: self.max_memory,
            serializer,
            label: self.label,
        }
    }

    /// Opens the database.
    ///
    /// Fails if the database file can't be opened or created.
    pub fn build(self) -> Result<FeOxDbBackend<S>, FeOxDbError> {
        let mut builder = FeoxStore::builder();

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("marquee.db");
            } else if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            builder = builder.device_path(path.to_string_lossy().to_string());
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        let store = builder.build()?;

        Ok(FeOxDbBackend {
            store: Arc::new(store),
            index_lock: Arc::new(Mutex::new(())),
            serializer: self.serializer,
            label: self.label,
        })
    }
}

fn join_error(err: tokio::task::JoinError) -> BackendError {
    BackendError::internal(err)
}

#[async_trait]
impl<S> Backend for FeOxDbBackend<S>
where
    S: Format + Clone + 'static,
{
    async fn read(&self, key: &EntryKey) -> BackendResult<Option<CachedResponse>> {
        let store = self.store.clone();
        let serializer = self.serializer.clone();
        let key_bytes = entry_key(key);

        tokio::task::spawn_blocking(move || -> BackendResult<Option<CachedResponse>> {
            match store.get(&key_bytes) {
                Ok(encoded) => Ok(Some(serializer.decode(&encoded)?)),
                Err(FeoxError::KeyNotFound) => Ok(None),
                Err(err) => Err(BackendError::internal(err)),
            }
        })
        .await
        .map_err(join_error)?
    }

    async fn write(&self, key: &EntryKey, value: CachedResponse) -> BackendResult<()> {
        let store = self.store.clone();
        let key = key.clone();
        let stored_at = value.stored_at();
        let value_bytes = self.serializer.encode(&value)?;

        let _guard = self.index_lock.lock().await;
        tokio::task::spawn_blocking(move || -> BackendResult<()> {
            store
                .insert(&entry_key(&key), &value_bytes)
                .map_err(BackendError::internal)?;
            let mut namespace_index = index::load_index(&store, key.namespace())?;
            namespace_index.upsert(key.request(), stored_at);
            index::save_index(&store, key.namespace(), &namespace_index)
        })
        .await
        .map_err(join_error)?
    }

    async fn remove(&self, key: &EntryKey) -> BackendResult<DeleteStatus> {
        let store = self.store.clone();
        let key = key.clone();

        let _guard = self.index_lock.lock().await;
        tokio::task::spawn_blocking(move || -> BackendResult<DeleteStatus> {
            let key_bytes = entry_key(&key);
            let exists = store.contains_key(&key_bytes);
            if exists {
                store.delete(&key_bytes).map_err(BackendError::internal)?;
            }
            let mut namespace_index = index::load_index(&store, key.namespace())?;
            if namespace_index.remove(key.request()) {
                index::save_index(&store, key.namespace(), &namespace_index)?;
            }
            Ok(if exists {
                DeleteStatus::Deleted(1)
            } else {
                DeleteStatus::Missing
            })
        })
        .await
        .map_err(join_error)?
    }

    async fn entries(&self, namespace: &str) -> BackendResult<Vec<EntryMeta>> {
        let store = self.store.clone();
        let namespace = namespace.to_owned();

        tokio::task::spawn_blocking(move || {
            index::load_index(&store, &namespace).map(|found| found.to_meta())
        })
        .await
        .map_err(join_error)?
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || {
            index::load_registry(&store)
                .map(|names| names.into_iter().map(SmolStr::from).collect::<Vec<_>>())
        })
        .await
        .map_err(join_error)?
    }

    async fn drop_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        let store = self.store.clone();
        let name = namespace.to_owned();

        let _guard = self.index_lock.lock().await;
        let status = tokio::task::spawn_blocking(move || -> BackendResult<DeleteStatus> {
            let namespace_index = index::load_index(&store, &name)?;
            if namespace_index.is_empty() {
                return Ok(DeleteStatus::Missing);
            }
            let mut deleted = 0u32;
            for request in namespace_index.requests() {
                let key_bytes = entry_key(&EntryKey::new(name.as_str(), request));
                if store.contains_key(&key_bytes) {
                    store.delete(&key_bytes).map_err(BackendError::internal)?;
                    deleted += 1;
                }
            }
            index::save_index(&store, &name, &index::NamespaceIndex::default())?;
            Ok(match deleted {
                0 => DeleteStatus::Missing,
                n => DeleteStatus::Deleted(n),
            })
        })
        .await
        .map_err(join_error)??;

        debug!(backend = %self.label, namespace, ?status, "dropped namespace");
        Ok(status)
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use marquee_backend::JsonFormat;
    use marquee_core::FetchResponse;
    use tempfile::TempDir;

    fn entry(body: &'static str) -> CachedResponse {
        CachedResponse::now(FetchResponse::ok(body))
    }

    #[tokio::test]
    async fn write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FeOxDbBackend::builder()
            .path(temp_dir.path())
            .build()
            .unwrap();

        let key = EntryKey::new("marquee-data-v1", "https://x.supabase.co/rest/v1/titles");
        backend.write(&key, entry("[1,2,3]")).await.unwrap();

        let result = backend.read(&key).await.unwrap().unwrap();
        assert_eq!(result.response().body().as_ref(), b"[1,2,3]");
    }

    #[tokio::test]
    async fn remove_updates_index() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        let key = EntryKey::new("marquee-data-v1", "a");
        backend.write(&key, entry("a")).await.unwrap();

        assert_eq!(backend.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
        assert_eq!(backend.remove(&key).await.unwrap(), DeleteStatus::Missing);
        assert!(backend.read(&key).await.unwrap().is_none());
        assert!(backend.entries("marquee-data-v1").await.unwrap().is_empty());
        assert!(backend.namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewrite_keeps_single_index_entry() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        let key = EntryKey::new("marquee-images-v1", "a.jpg");
        let older = CachedResponse::new(FetchResponse::opaque("x"), Utc::now() - Duration::hours(1));
        backend.write(&key, older).await.unwrap();
        let newer = entry("y");
        let newer_at = newer.stored_at();
        backend.write(&key, newer).await.unwrap();

        let entries = backend.entries("marquee-images-v1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stored_at, newer_at);
    }

    #[tokio::test]
    async fn drop_namespace_keeps_others() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        for request in ["a", "b"] {
            backend
                .write(&EntryKey::new("marquee-precache-1", request), entry("x"))
                .await
                .unwrap();
        }
        let kept = EntryKey::new("marquee-precache-2", "a");
        backend.write(&kept, entry("x")).await.unwrap();

        assert_eq!(
            backend.drop_namespace("marquee-precache-1").await.unwrap(),
            DeleteStatus::Deleted(2)
        );
        assert_eq!(
            backend.namespaces().await.unwrap(),
            vec![SmolStr::new("marquee-precache-2")]
        );
        assert!(backend.read(&kept).await.unwrap().is_some());
        assert_eq!(
            backend.drop_namespace("marquee-precache-1").await.unwrap(),
            DeleteStatus::Missing
        );
    }

    #[tokio::test]
    async fn json_format_is_readable_back() {
        let backend = FeOxDbBackend::builder()
            .value_format(JsonFormat)
            .label("disk")
            .build()
            .unwrap();
        let key = EntryKey::new("marquee-data-v1", "a");
        backend.write(&key, entry("{}")).await.unwrap();
        assert!(backend.read(&key).await.unwrap().is_some());
        assert_eq!(backend.label().as_str(), "disk");
    }

    #[tokio::test]
    async fn flush_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("marquee.db");
        let key = EntryKey::new("marquee-images-v1", "poster.jpg");

        {
            let backend = FeOxDbBackend::builder()
                .path(temp_dir.path())
                .build()
                .unwrap();
            backend.write(&key, entry("poster")).await.unwrap();
            backend.flush();
        }

        let backend = FeOxDbBackend::builder().path(&db_path).build().unwrap();
        let result = backend.read(&key).await.unwrap();
        assert!(result.is_some(), "entry should persist after flush and reopen");
        assert_eq!(
            backend.namespaces().await.unwrap(),
            vec![SmolStr::new("marquee-images-v1")]
        );
    }
}
