mod common;

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use common::{
    MockFetcher, UnavailableStorage, harness, harness_with, images_cache, metadata_cache, ready,
    table,
};
use marquee::{CacheError, Namespace, Orchestrator, PrecacheManifest, WorkerConfig, WorkerState};
use marquee_backend::Backend;
use marquee_core::{CachedResponse, EntryKey, Fetch, FetchRequest, FetchResponse};
use marquee_moka::MokaBackend;
use pretty_assertions::assert_eq;

const POSTER: &str = "https://image.tmdb.org/t/p/w500/poster.jpg";
const MOVIE: &str = "https://api.themoviedb.org/3/movie/42";

fn image(url: &str) -> FetchRequest {
    FetchRequest::image(url.parse().unwrap())
}

fn get(url: &str) -> FetchRequest {
    FetchRequest::get(url.parse().unwrap())
}

#[tokio::test]
async fn cache_first_serves_second_request_without_network() {
    let h = ready().await;
    h.network.respond(POSTER, FetchResponse::opaque("jpeg"));

    let first = h.worker.handle(image(POSTER)).await.unwrap();
    let second = h.worker.handle(image(POSTER)).await.unwrap();

    assert_eq!(first.body(), second.body());
    assert_eq!(h.network.calls(POSTER), 1);
}

#[tokio::test]
async fn cache_first_refetches_after_max_age() {
    let h = ready().await;
    h.network.ok(POSTER, "fresh");
    let namespace = h.worker.runtime(&images_cache());
    let stale = CachedResponse::new(FetchResponse::ok("stale"), Utc::now() - TimeDelta::days(31));
    h.backend.write(&namespace.key(POSTER), stale).await.unwrap();

    let response = h.worker.handle(image(POSTER)).await.unwrap();

    assert_eq!(response.body().as_ref(), b"fresh");
    assert_eq!(h.network.calls(POSTER), 1);
}

#[tokio::test]
async fn cache_first_evicts_oldest_past_max_entries() {
    let h = ready().await;
    let urls: Vec<String> = (0..4)
        .map(|i| format!("https://image.tmdb.org/t/p/w500/{i}.jpg"))
        .collect();
    for url in &urls {
        h.network.ok(url, "jpeg");
        h.worker.handle(image(url)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    // max_entries is 3; the first poster went out
    h.worker.handle(image(&urls[0])).await.unwrap();
    h.worker.handle(image(&urls[3])).await.unwrap();
    assert_eq!(h.network.calls(&urls[0]), 2);
    assert_eq!(h.network.calls(&urls[3]), 1);
}

#[tokio::test]
async fn non_cacheable_responses_are_not_stored() {
    let h = ready().await;
    h.network.respond(
        MOVIE,
        FetchResponse::new(http::StatusCode::INTERNAL_SERVER_ERROR, "oops"),
    );

    let first = h.worker.handle(get(MOVIE)).await.unwrap();
    assert_eq!(first.status_code(), 500);
    h.worker.handle(get(MOVIE)).await.unwrap();
    assert_eq!(h.network.calls(MOVIE), 2);
}

#[tokio::test]
async fn stale_while_revalidate_serves_cache_and_refreshes() {
    let h = ready().await;
    h.network.ok(MOVIE, "v1");
    assert_eq!(h.worker.handle(get(MOVIE)).await.unwrap().body().as_ref(), b"v1");

    h.network.ok(MOVIE, "v2");
    let cached = h.worker.handle(get(MOVIE)).await.unwrap();
    assert_eq!(cached.body().as_ref(), b"v1");

    h.worker.offload().wait_all().await;
    assert_eq!(h.network.calls(MOVIE), 2);
    let refreshed = h.worker.handle(get(MOVIE)).await.unwrap();
    assert_eq!(refreshed.body().as_ref(), b"v2");
}

#[tokio::test]
async fn stale_while_revalidate_keeps_cache_when_offline() {
    let h = ready().await;
    h.network.ok(MOVIE, "v1");
    h.worker.handle(get(MOVIE)).await.unwrap();

    h.network.set_offline(true);
    let cached = h.worker.handle(get(MOVIE)).await.unwrap();
    h.worker.offload().wait_all().await;

    assert_eq!(cached.body().as_ref(), b"v1");
    let namespace = h.worker.runtime(&metadata_cache());
    assert_eq!(namespace.get(MOVIE).await.unwrap().body().as_ref(), b"v1");
}

#[tokio::test]
async fn miss_without_network_propagates_failure() {
    let h = ready().await;
    h.network.set_offline(true);

    let error = h.worker.handle(get(MOVIE)).await.unwrap_err();
    assert!(matches!(error, CacheError::Network(_)));
}

#[tokio::test]
async fn navigation_offline_returns_cached_shell() {
    let h = ready().await;
    h.network.set_offline(true);
    let calls = h.network.total_calls();

    let navigation = FetchRequest::navigate("https://marquee.app/movie/42".parse().unwrap());
    let shell = h.worker.handle(navigation).await.unwrap();

    assert_eq!(shell.body().as_ref(), b"<html>shell</html>");
    assert_eq!(h.network.total_calls(), calls);
}

#[tokio::test]
async fn cold_install_with_failing_asset_still_serves_shell() {
    let h = harness();
    h.network.fail("https://marquee.app/assets/app.js");

    let report = h.worker.install().await;
    assert_eq!(report.cached, 1);
    assert_eq!(report.failed, vec!["/assets/app.js".to_owned()]);
    assert_eq!(h.worker.state(), WorkerState::Installed);

    h.worker.activate().await;
    let navigation = FetchRequest::navigate("https://marquee.app/".parse().unwrap());
    let shell = h.worker.handle(navigation).await.unwrap();
    assert_eq!(shell.body().as_ref(), b"<html>shell</html>");
}

#[tokio::test]
async fn missing_shell_falls_back_to_network_then_fails() {
    let h = harness();
    h.network.fail("https://marquee.app/index.html");
    h.worker.install().await;
    h.worker.activate().await;

    h.network.ok("https://marquee.app/movie/1", "<html>server</html>");
    let navigation = FetchRequest::navigate("https://marquee.app/movie/1".parse().unwrap());
    let response = h.worker.handle(navigation.clone()).await.unwrap();
    assert_eq!(response.body().as_ref(), b"<html>server</html>");

    h.network.set_offline(true);
    let error = h.worker.handle(navigation).await.unwrap_err();
    assert!(matches!(error, CacheError::ShellUnavailable(_)));
}

#[tokio::test]
async fn precached_assets_are_served_from_precache() {
    let h = ready().await;
    h.network.set_offline(true);

    let script = h
        .worker
        .handle(get("https://marquee.app/assets/app.js"))
        .await
        .unwrap();
    assert_eq!(script.body().as_ref(), b"console.log(1)");
}

#[tokio::test]
async fn writes_to_precached_urls_reach_the_network() {
    let h = ready().await;
    h.network.ok("https://marquee.app/assets/app.js", "server-post-reply");

    let reply = h
        .worker
        .handle(FetchRequest::new(
            http::Method::POST,
            "https://marquee.app/assets/app.js".parse().unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(reply.body().as_ref(), b"server-post-reply");
    assert_eq!(h.network.calls("https://marquee.app/assets/app.js"), 2);
    let script = h
        .worker
        .handle(get("https://marquee.app/assets/app.js"))
        .await
        .unwrap();
    assert_eq!(script.body().as_ref(), b"console.log(1)");
}

#[tokio::test]
async fn uncontrolled_until_activated() {
    let h = harness();
    h.worker.install().await;
    h.network.ok(POSTER, "jpeg");

    h.worker.handle(image(POSTER)).await.unwrap();
    h.worker.handle(image(POSTER)).await.unwrap();
    assert_eq!(h.network.calls(POSTER), 2);
    assert!(h.worker.runtime(&images_cache()).get(POSTER).await.is_none());
}

#[tokio::test]
async fn activate_drops_stale_owned_namespaces_only() {
    let backend = Arc::new(MokaBackend::builder().max_entries(1000).build());
    let entry = || CachedResponse::now(FetchResponse::ok("x"));
    for namespace in [
        "marquee-precache-rev0",
        "marquee-images-v0",
        "marquee-images-v1",
        "other-app-cache",
    ] {
        backend
            .write(&EntryKey::new(namespace, "k"), entry())
            .await
            .unwrap();
    }

    let h = harness_with(MockFetcher::new(), backend);
    h.worker.install().await;
    let report = h.worker.activate().await;

    assert_eq!(report.dropped, vec!["marquee-images-v0", "marquee-precache-rev0"]);
    let mut remaining = h.backend.namespaces().await.unwrap();
    remaining.sort();
    assert_eq!(
        remaining,
        vec!["marquee-images-v1", "marquee-precache-rev1", "other-app-cache"]
    );
    assert_eq!(h.worker.state(), WorkerState::Activated);
}

#[tokio::test]
async fn activate_sweeps_expired_runtime_entries() {
    let h = harness();
    let namespace = h.worker.runtime(&metadata_cache());
    let stale = CachedResponse::new(FetchResponse::ok("old"), Utc::now() - TimeDelta::days(8));
    h.backend.write(&namespace.key(MOVIE), stale).await.unwrap();

    h.worker.install().await;
    let report = h.worker.activate().await;

    assert_eq!(report.purged, 1);
    assert!(h.backend.read(&namespace.key(MOVIE)).await.unwrap().is_none());
}

#[tokio::test]
async fn worker_is_a_fetch_source() {
    let h = ready().await;
    h.network.ok(POSTER, "jpeg");
    let source: &dyn Fetch = &h.worker;

    source.fetch(image(POSTER)).await.unwrap();
    source.fetch(image(POSTER)).await.unwrap();
    assert_eq!(h.network.calls(POSTER), 1);
}

#[tokio::test]
async fn failing_namespace_reads_as_miss() {
    let namespace = Namespace::runtime("marquee", &images_cache(), Arc::new(UnavailableStorage));

    assert!(namespace.get(POSTER).await.is_none());
    assert!(!namespace.contains(POSTER).await);
    assert!(!namespace.put(POSTER, FetchResponse::ok("jpeg")).await);
    assert_eq!(namespace.purge_expired().await, 0);
}

#[tokio::test]
async fn disabled_storage_falls_back_to_network() {
    let network = MockFetcher::new();
    network.ok("https://marquee.app/index.html", "<html>shell</html>");
    network.ok("https://marquee.app/assets/app.js", "console.log(1)");
    network.ok(POSTER, "jpeg");
    network.ok(MOVIE, "{}");
    let worker = Orchestrator::builder(
        table(),
        PrecacheManifest::new("rev1", ["/assets/app.js"]),
    )
    .backend(UnavailableStorage)
    .network(network.clone())
    .config(WorkerConfig::default().with_scope(common::SCOPE))
    .build();

    let report = worker.install().await;
    assert_eq!(report.cached, 0);
    assert_eq!(report.failed.len(), 2);
    let activated = worker.activate().await;
    assert!(activated.dropped.is_empty());
    assert_eq!(worker.state(), WorkerState::Activated);

    let shell = worker
        .handle(FetchRequest::navigate(
            "https://marquee.app/index.html".parse().unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(shell.body().as_ref(), b"<html>shell</html>");
    for _ in 0..2 {
        assert_eq!(worker.handle(image(POSTER)).await.unwrap().body().as_ref(), b"jpeg");
        assert_eq!(worker.handle(get(MOVIE)).await.unwrap().body().as_ref(), b"{}");
    }
    worker.offload().wait_all().await;
    assert_eq!(network.calls(POSTER), 2);
    assert_eq!(network.calls(MOVIE), 2);
}
