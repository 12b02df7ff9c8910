//! Local storage sharing a database file with cache namespaces.

use marquee_backend::{Backend, DeleteStatus, KeyValueStore};
use marquee_core::{CachedResponse, EntryKey, FetchResponse};
use marquee_feoxdb::{FeOxDbBackend, FeOxDbStore};
use tempfile::TempDir;

#[tokio::test]
async fn store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let backend = FeOxDbBackend::builder()
            .path(temp_dir.path())
            .build()
            .unwrap();
        let local = backend.store();
        local
            .set("marquee:user:homepage", r#"{"sections":{}}"#.to_owned())
            .await
            .unwrap();
        backend.flush();
    }

    let backend = FeOxDbBackend::builder()
        .path(temp_dir.path().join("marquee.db"))
        .build()
        .unwrap();
    let value = backend.store().get("marquee:user:homepage").await.unwrap();
    assert_eq!(value.as_deref(), Some(r#"{"sections":{}}"#));
}

#[tokio::test]
async fn store_keys_do_not_leak_into_namespaces() {
    let backend = FeOxDbBackend::in_memory().unwrap();
    let local = backend.store();
    local.set("marquee:session-id", "s1".to_owned()).await.unwrap();

    let key = EntryKey::new("marquee-data-v1", "marquee:session-id");
    assert!(backend.read(&key).await.unwrap().is_none());
    backend
        .write(&key, CachedResponse::now(FetchResponse::ok("x")))
        .await
        .unwrap();

    assert_eq!(
        local.get("marquee:session-id").await.unwrap().as_deref(),
        Some("s1")
    );
    assert_eq!(backend.namespaces().await.unwrap().len(), 1);
}

#[tokio::test]
async fn remove_reports_missing() {
    let local = FeOxDbStore::in_memory().unwrap().with_label("persistent");
    assert_eq!(local.remove("absent").await.unwrap(), DeleteStatus::Missing);
    local.set("present", "1".to_owned()).await.unwrap();
    assert_eq!(local.remove("present").await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(local.get("present").await.unwrap(), None);
    assert_eq!(local.label().as_str(), "persistent");
}
