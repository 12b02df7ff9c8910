//! Key layout inside the database file.
//!
//! | key                      | value                                  |
//! |--------------------------|----------------------------------------|
//! | `e:{namespace}\|{request}` | encoded [`CachedResponse`]             |
//! | `i:{namespace}`          | [`NamespaceIndex`] of that namespace   |
//! | `r:namespaces`           | sorted list of namespace names         |
//! | `kv:{key}`               | raw UTF-8 value of [`FeOxDbStore`]     |
//!
//! [`CachedResponse`]: marquee_core::CachedResponse
//! [`FeOxDbStore`]: crate::FeOxDbStore

use bincode::config::standard as bincode_config;
use bincode::serde::{decode_from_slice, encode_to_vec};
use chrono::{DateTime, Utc};
use feoxdb::{FeoxError, FeoxStore};
use marquee_backend::{BackendError, BackendResult, EntryMeta, FormatError};
use marquee_core::EntryKey;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

const REGISTRY_KEY: &[u8] = b"r:namespaces";

pub(crate) fn entry_key(key: &EntryKey) -> Vec<u8> {
    format!("e:{key}").into_bytes()
}

pub(crate) fn index_key(namespace: &str) -> Vec<u8> {
    format!("i:{namespace}").into_bytes()
}

pub(crate) fn value_key(key: &str) -> Vec<u8> {
    format!("kv:{key}").into_bytes()
}

/// Entries of one namespace with their write times.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct NamespaceIndex {
    entries: Vec<(String, DateTime<Utc>)>,
}

impl NamespaceIndex {
    pub(crate) fn upsert(&mut self, request: &str, stored_at: DateTime<Utc>) {
        match self.entries.iter_mut().find(|(key, _)| key == request) {
            Some(entry) => entry.1 = stored_at,
            None => self.entries.push((request.to_owned(), stored_at)),
        }
    }

    pub(crate) fn remove(&mut self, request: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(key, _)| key != request);
        self.entries.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn requests(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub(crate) fn to_meta(&self) -> Vec<EntryMeta> {
        self.entries
            .iter()
            .map(|(key, stored_at)| EntryMeta {
                key: SmolStr::new(key),
                stored_at: *stored_at,
            })
            .collect()
    }
}

/// Reads a bincode value, treating a missing key as the default.
fn load<T>(store: &FeoxStore, key: &[u8]) -> BackendResult<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match store.get(key) {
        Ok(bytes) => decode_from_slice(&bytes, bincode_config())
            .map(|(value, _)| value)
            .map_err(|err| BackendError::from(FormatError::Deserialize(Box::new(err)))),
        Err(FeoxError::KeyNotFound) => Ok(T::default()),
        Err(err) => Err(BackendError::internal(err)),
    }
}

fn save<T: Serialize>(store: &FeoxStore, key: &[u8], value: &T) -> BackendResult<()> {
    let bytes = encode_to_vec(value, bincode_config())
        .map_err(|err| BackendError::from(FormatError::Serialize(Box::new(err))))?;
    store.insert(key, &bytes).map_err(BackendError::internal)?;
    Ok(())
}

pub(crate) fn load_index(store: &FeoxStore, namespace: &str) -> BackendResult<NamespaceIndex> {
    load(store, &index_key(namespace))
}

/// Persists `index`, removing the index key and the registry entry when it
/// became empty.
pub(crate) fn save_index(
    store: &FeoxStore,
    namespace: &str,
    index: &NamespaceIndex,
) -> BackendResult<()> {
    let key = index_key(namespace);
    let mut registry = load_registry(store)?;
    if index.is_empty() {
        if store.contains_key(&key) {
            store.delete(&key).map_err(BackendError::internal)?;
        }
        if let Ok(position) = registry.binary_search_by(|name| name.as_str().cmp(namespace)) {
            registry.remove(position);
            save(store, REGISTRY_KEY, &registry)?;
        }
        return Ok(());
    }
    save(store, &key, index)?;
    if let Err(position) = registry.binary_search_by(|name| name.as_str().cmp(namespace)) {
        registry.insert(position, namespace.to_owned());
        save(store, REGISTRY_KEY, &registry)?;
    }
    Ok(())
}

pub(crate) fn load_registry(store: &FeoxStore) -> BackendResult<Vec<String>> {
    load(store, REGISTRY_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_timestamp() {
        let mut index = NamespaceIndex::default();
        let first = Utc::now();
        index.upsert("a", first);
        index.upsert("b", first);
        let later = first + chrono::Duration::seconds(5);
        index.upsert("a", later);

        let meta = index.to_meta();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[0].key, "a");
        assert_eq!(meta[0].stored_at, later);
    }

    #[test]
    fn remove_reports_presence() {
        let mut index = NamespaceIndex::default();
        index.upsert("a", Utc::now());
        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert!(index.is_empty());
    }

    #[test]
    fn key_layout() {
        let key = EntryKey::new("marquee-data-v1", "https://x.supabase.co/a?b=1");
        assert_eq!(entry_key(&key), b"e:marquee-data-v1|https://x.supabase.co/a?b=1");
        assert_eq!(index_key("marquee-data-v1"), b"i:marquee-data-v1");
        assert_eq!(value_key("marquee:user:homepage"), b"kv:marquee:user:homepage");
    }
}
