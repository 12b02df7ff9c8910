use std::time::Duration;

use marquee::offload::TimeoutPolicy;
use marquee::strategy::{Route, Strategy};
use marquee_configuration::{
    CacheableConfig, ConfigError, ConfigRule, ConfigWorker, DestinationConfig, Matcher,
    RuntimeCacheConfig, StrategyConfig,
};
use marquee_core::{FetchRequest, FetchResponse};
use pretty_assertions::assert_eq;

const YAML: &str = r#"
scope: https://marquee.app/
prefix: marquee
shell: /index.html
precache:
  revision: 2f1c9e
  urls:
    - /assets/app-2f1c9e.js
    - /assets/app-2f1c9e.css
precache_concurrency: 4
offload:
  mode: warn
  after: 10s
priority:
  max_urls: 20
rules:
  - name: metadata
    match:
      Host: api.themoviedb.org
    strategy:
      StaleWhileRevalidate:
        cache: tmdb-api
        max_entries: 500
        max_age: 7d
  - name: images
    match:
      Or:
        - Destination: image
        - Host: image.tmdb.org
    strategy:
      CacheFirst:
        cache: images
        version: 2
        max_entries: 1500
        max_age: 30d
    cacheable:
      opaque: true
  - name: auth
    match:
      And:
        - Host: "*.supabase.co"
        - PathPrefix: /auth/
    strategy: NetworkOnly
"#;

#[test]
fn parses_full_document() {
    let config = ConfigWorker::from_yaml(YAML).unwrap();

    assert_eq!(config.scope.as_deref(), Some("https://marquee.app/"));
    assert_eq!(config.precache.revision, "2f1c9e");
    assert_eq!(config.precache_concurrency.get(), 4);
    assert_eq!(
        config.offload,
        TimeoutPolicy::Warn {
            after: Duration::from_secs(10)
        }
    );
    assert_eq!(config.priority.max_urls, 20);
    assert_eq!(config.priority.version, 1);
    assert_eq!(
        config.rules[1],
        ConfigRule {
            name: "images".to_owned(),
            matcher: Matcher::Or(vec![
                Matcher::Destination(DestinationConfig::Image),
                Matcher::Host("image.tmdb.org".to_owned()),
            ]),
            strategy: StrategyConfig::CacheFirst(RuntimeCacheConfig {
                cache: "images".to_owned(),
                version: 2,
                max_entries: Some(1500),
                max_age: Some(Duration::from_secs(30 * 24 * 3600)),
            }),
            cacheable: CacheableConfig {
                statuses: vec![200],
                opaque: true,
            },
        }
    );
    assert_eq!(config.rules[2].strategy, StrategyConfig::NetworkOnly);
}

#[test]
fn builds_table_manifest_and_config() {
    let worker = ConfigWorker::from_yaml(YAML).unwrap().into_worker().unwrap();

    assert_eq!(worker.table.app_shell().url(), "/index.html");
    assert_eq!(worker.manifest.namespace("marquee"), "marquee-precache-2f1c9e");
    assert_eq!(worker.config.scope.as_deref(), Some("https://marquee.app/"));

    let poster = FetchRequest::image("https://image.tmdb.org/t/p/w500/a.jpg".parse().unwrap());
    let Route::Rule(rule) = worker.table.route(&poster) else {
        panic!("expected the images rule");
    };
    assert_eq!(rule.name(), "images");
    assert!(matches!(rule.strategy(), Strategy::CacheFirst(cache) if cache.namespace("marquee") == "marquee-images-v2"));
    assert!(rule.cacheable_response().accepts(&FetchResponse::opaque("")));

    let login = FetchRequest::get("https://xyz.supabase.co/auth/v1/token".parse().unwrap());
    let Route::Rule(rule) = worker.table.route(&login) else {
        panic!("expected the auth rule");
    };
    assert_eq!(rule.name(), "auth");

    let data = FetchRequest::get("https://xyz.supabase.co/rest/v1/titles".parse().unwrap());
    assert!(matches!(worker.table.route(&data), Route::Passthrough));
}

#[test]
fn defaults_reproduce_the_media_table() {
    let worker = ConfigWorker::default().into_worker().unwrap();
    let caches: Vec<(String, Option<usize>)> = worker
        .table
        .runtime_caches()
        .map(|cache| (cache.namespace("marquee").to_string(), cache.max_entries()))
        .collect();
    assert_eq!(
        caches,
        vec![
            ("marquee-tmdb-api-v1".to_owned(), Some(500)),
            ("marquee-supabase-data-v1".to_owned(), Some(200)),
            ("marquee-images-v1".to_owned(), Some(1500)),
        ]
    );

    let poster = FetchRequest::get("https://image.tmdb.org/t/p/w500/a.jpg".parse().unwrap());
    assert!(matches!(
        worker.table.route(&poster),
        Route::Rule(rule) if rule.name() == "images"
    ));
}

#[test]
fn minimal_document_uses_defaults() {
    let config = ConfigWorker::from_yaml("precache:\n  revision: abc\n").unwrap();
    assert_eq!(config.prefix, "marquee");
    assert_eq!(config.shell, "/index.html");
    assert!(config.rules.is_empty());
    assert_eq!(config.priority.max_urls, 50);
}

#[test]
fn rejects_bad_documents() {
    let bad_regex = r#"
rules:
  - name: broken
    match:
      Path: "(["
    strategy: NetworkOnly
"#;
    let error = ConfigWorker::from_yaml(bad_regex).unwrap().into_worker().unwrap_err();
    assert!(matches!(error, ConfigError::Regex(_)));

    let zero = r#"
rules:
  - name: images
    match: Any
    strategy:
      CacheFirst:
        cache: images
        max_entries: 0
"#;
    let error = ConfigWorker::from_yaml(zero).unwrap().into_worker().unwrap_err();
    assert!(matches!(error, ConfigError::InvalidBound { .. }));

    let relative_scope = "scope: /app/\n";
    let error = ConfigWorker::from_yaml(relative_scope).unwrap().into_worker().unwrap_err();
    assert!(matches!(error, ConfigError::InvalidScope(_)));

    let empty_and = r#"
rules:
  - name: nothing
    match:
      And: []
    strategy: NetworkOnly
"#;
    let error = ConfigWorker::from_yaml(empty_and).unwrap().into_worker().unwrap_err();
    assert!(matches!(error, ConfigError::EmptyMatcherList("And")));

    assert!(ConfigWorker::from_yaml("precache_concurrency: 0\n").is_err());
}
