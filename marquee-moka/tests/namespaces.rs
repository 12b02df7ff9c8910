//! Namespace listing and dropping on the Moka backend.

use chrono::{Duration, Utc};
use marquee_backend::{Backend, DeleteStatus};
use marquee_core::{CachedResponse, EntryKey, FetchResponse};
use marquee_moka::MokaBackend;

fn entry(age_secs: i64) -> CachedResponse {
    CachedResponse::new(
        FetchResponse::ok("payload"),
        Utc::now() - Duration::seconds(age_secs),
    )
}

#[tokio::test]
async fn read_write_remove() {
    let backend = MokaBackend::builder().max_entries(100).build();
    let key = EntryKey::new("marquee-images-v1", "https://image.tmdb.org/a.jpg");

    assert!(backend.read(&key).await.unwrap().is_none());
    backend.write(&key, entry(0)).await.unwrap();
    assert!(backend.contains(&key).await.unwrap());
    assert_eq!(backend.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(backend.remove(&key).await.unwrap(), DeleteStatus::Missing);
}

#[tokio::test]
async fn entries_are_scoped_to_their_namespace() {
    let backend = MokaBackend::builder().max_entries(100).build();
    backend
        .write(&EntryKey::new("marquee-images-v1", "a"), entry(30))
        .await
        .unwrap();
    backend
        .write(&EntryKey::new("marquee-images-v1", "b"), entry(10))
        .await
        .unwrap();
    backend
        .write(&EntryKey::new("marquee-data-v1", "c"), entry(0))
        .await
        .unwrap();

    let mut images: Vec<_> = backend
        .entries("marquee-images-v1")
        .await
        .unwrap()
        .into_iter()
        .map(|meta| meta.key)
        .collect();
    images.sort();
    assert_eq!(images, vec!["a", "b"]);
    assert!(backend.entries("unknown").await.unwrap().is_empty());

    assert_eq!(
        backend.namespaces().await.unwrap(),
        vec!["marquee-data-v1", "marquee-images-v1"]
    );
}

#[tokio::test]
async fn drop_namespace_leaves_others() {
    let backend = MokaBackend::builder().max_bytes(1024 * 1024).build();
    for request in ["a", "b", "c"] {
        backend
            .write(&EntryKey::new("marquee-images-v1", request), entry(0))
            .await
            .unwrap();
    }
    let kept = EntryKey::new("marquee-images-v2", "a");
    backend.write(&kept, entry(0)).await.unwrap();

    assert_eq!(
        backend.drop_namespace("marquee-images-v1").await.unwrap(),
        DeleteStatus::Deleted(3)
    );
    assert_eq!(
        backend.drop_namespace("marquee-images-v1").await.unwrap(),
        DeleteStatus::Missing
    );
    assert!(backend.read(&kept).await.unwrap().is_some());
    assert_eq!(backend.namespaces().await.unwrap(), vec!["marquee-images-v2"]);
}
