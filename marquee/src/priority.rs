//! Page-to-worker side channel forcing URLs into the priority namespace.
//!
//! The page posts `{ "type": "CACHE_PRIORITY_ITEMS", "payload": { "routeKey",
//! "urls" } }` and never hears back. The worker fetches what is missing and
//! swallows every failure.

use std::collections::HashSet;

use futures::future::join_all;
use marquee_core::{Credentials, Fetch, FetchRequest, RequestMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{Instrument, debug, info_span, warn};

use crate::metrics;
use crate::orchestrator::Orchestrator;

/// URLs to keep available offline for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCacheRequest {
    /// The page route the URLs belong to.
    pub route_key: String,
    /// URLs in priority order.
    pub urls: Vec<String>,
}

/// Messages the page sends to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WorkerMessage {
    #[serde(rename = "CACHE_PRIORITY_ITEMS")]
    CachePriorityItems(PriorityCacheRequest),
}

/// Page side of the channel.
#[derive(Debug, Clone)]
pub struct PriorityChannel {
    sender: UnboundedSender<Value>,
}

impl PriorityChannel {
    /// Creates the channel and the receiver to hand to [`Orchestrator::serve`].
    pub fn new() -> (Self, UnboundedReceiver<Value>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Posts a priority cache request. Never blocks, never reports back.
    pub fn post<I, S>(&self, route_key: impl Into<String>, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let message = WorkerMessage::CachePriorityItems(PriorityCacheRequest {
            route_key: route_key.into(),
            urls: urls.into_iter().map(Into::into).collect(),
        });
        let value = match serde_json::to_value(&message) {
            Ok(value) => value,
            Err(error) => {
                debug!(%error, "priority message did not serialize");
                return;
            }
        };
        if self.sender.send(value).is_err() {
            debug!("worker is gone, priority message dropped");
        }
    }
}

/// Outcome of one priority cache request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityReport {
    /// URLs fetched and stored.
    pub stored: usize,
    /// URLs already present, or duplicates within the request.
    pub skipped: usize,
    /// URLs that failed to parse, fetch, or store.
    pub failed: usize,
    /// URLs past the per-request limit.
    pub dropped: usize,
}

enum Outcome {
    Stored,
    Skipped,
    Failed,
}

impl<F> Orchestrator<F>
where
    F: Fetch + 'static,
{
    /// Decodes one raw message and schedules its work in the background.
    ///
    /// Returns `false` for messages the worker does not understand; those are
    /// dropped.
    pub fn dispatch(&self, message: Value) -> bool {
        let message = match serde_json::from_value::<WorkerMessage>(message) {
            Ok(message) => message,
            Err(error) => {
                debug!(%error, "ignoring malformed worker message");
                return false;
            }
        };
        match message {
            WorkerMessage::CachePriorityItems(request) => {
                let worker = self.clone();
                self.inner.offload.spawn("priority", async move {
                    worker.cache_priority(request).await;
                });
            }
        }
        true
    }

    /// Dispatches every message from `receiver` until the page side closes.
    pub async fn serve(&self, mut receiver: UnboundedReceiver<Value>) {
        while let Some(message) = receiver.recv().await {
            self.dispatch(message);
        }
        debug!("priority channel closed");
    }

    /// Fetches and stores every URL of `request` not yet in the priority namespace.
    pub async fn cache_priority(&self, request: PriorityCacheRequest) -> PriorityReport {
        let span = info_span!("priority_cache", route_key = %request.route_key);
        async move {
            let max = self.inner.config.priority.max_urls;
            let mut report = PriorityReport {
                dropped: request.urls.len().saturating_sub(max),
                ..PriorityReport::default()
            };
            let mut seen = HashSet::new();
            let mut urls = Vec::new();
            for url in request.urls.into_iter().take(max) {
                if seen.insert(url.clone()) {
                    urls.push(url);
                } else {
                    report.skipped += 1;
                }
            }

            let outcomes = join_all(urls.iter().map(|url| self.cache_priority_url(url))).await;
            for outcome in outcomes {
                match outcome {
                    Outcome::Stored => report.stored += 1,
                    Outcome::Skipped => report.skipped += 1,
                    Outcome::Failed => report.failed += 1,
                }
            }
            debug!(
                stored = report.stored,
                skipped = report.skipped,
                failed = report.failed,
                dropped = report.dropped,
                "priority cache request done"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn cache_priority_url(&self, url: &str) -> Outcome {
        let Some(uri) = self.inner.config.resolve(url) else {
            debug!(url, "priority url does not parse");
            return Outcome::Failed;
        };
        let key = SmolStr::new(uri.to_string());
        if self.inner.priority.contains(&key).await {
            return Outcome::Skipped;
        }
        let request = FetchRequest::get(uri)
            .with_mode(RequestMode::Cors)
            .with_credentials(Credentials::Omit);
        match self.network(request, "priority").await {
            Ok(response) if response.is_ok() => {
                if self.inner.priority.put(&key, response).await {
                    metrics::record_priority_stored();
                    Outcome::Stored
                } else {
                    Outcome::Failed
                }
            }
            Ok(response) => {
                debug!(url, status = response.status_code(), "priority url not stored");
                Outcome::Failed
            }
            Err(error) => {
                warn!(url, %error, "priority url fetch failed");
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wire_format() {
        let message = WorkerMessage::CachePriorityItems(PriorityCacheRequest {
            route_key: "/movie/42".to_owned(),
            urls: vec!["https://image.tmdb.org/a.jpg".to_owned()],
        });
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "CACHE_PRIORITY_ITEMS",
                "payload": { "routeKey": "/movie/42", "urls": ["https://image.tmdb.org/a.jpg"] }
            })
        );
    }

    #[test]
    fn unknown_type_does_not_decode() {
        let raw = json!({ "type": "SKIP_WAITING" });
        assert!(serde_json::from_value::<WorkerMessage>(raw).is_err());
    }

    #[tokio::test]
    async fn post_never_blocks_and_serializes() {
        let (channel, mut receiver) = PriorityChannel::new();
        channel.post("/", ["a", "b"]);
        let value = receiver.recv().await.unwrap();
        assert_eq!(value["payload"]["urls"], json!(["a", "b"]));
    }
}
