//! [`Fetch`] implementation over reqwest.

use async_trait::async_trait;
use http::header::{AUTHORIZATION, COOKIE};
use http::uri::{Authority, Scheme};
use http::{HeaderMap, Uri};
use marquee_core::{
    Credentials, Fetch, FetchError, FetchRequest, FetchResponse, RequestMode, ResponseType,
};
use tracing::debug;

#[derive(Debug, Clone)]
struct Origin {
    scheme: Scheme,
    authority: Authority,
}

impl Origin {
    fn matches(&self, uri: &Uri) -> bool {
        uri.scheme() == Some(&self.scheme) && uri.authority() == Some(&self.authority)
    }
}

/// Network fetcher backed by a [`reqwest::Client`].
///
/// Cloning is cheap; the client's connection pool is shared.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    origin: Option<Origin>,
}

impl ReqwestFetcher {
    /// Wraps `client`. Without an origin every response is basic and
    /// relative URLs are rejected.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            origin: None,
        }
    }

    /// Sets the page origin used for relative URLs and same-origin checks.
    ///
    /// Only the scheme and authority of `origin` are kept.
    pub fn with_origin(mut self, origin: Uri) -> Self {
        let parts = origin.into_parts();
        self.origin = parts
            .scheme
            .zip(parts.authority)
            .map(|(scheme, authority)| Origin { scheme, authority });
        self
    }

    fn absolute_url(&self, uri: &Uri) -> Result<String, FetchError> {
        if uri.scheme().is_some() && uri.authority().is_some() {
            return Ok(uri.to_string());
        }
        let origin = self.origin.as_ref().ok_or_else(|| FetchError::InvalidUrl {
            url: uri.to_string(),
        })?;
        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        Ok(format!("{}://{}{}", origin.scheme, origin.authority, path))
    }

    fn is_same_origin(&self, url: &str) -> bool {
        match (&self.origin, url.parse::<Uri>()) {
            (Some(origin), Ok(uri)) => origin.matches(&uri),
            (None, _) => true,
            (Some(_), Err(_)) => false,
        }
    }

    fn response_type(&self, mode: RequestMode, same_origin: bool) -> ResponseType {
        match (same_origin, mode) {
            (true, _) => ResponseType::Basic,
            (false, RequestMode::NoCors) => ResponseType::Opaque,
            (false, _) => ResponseType::Cors,
        }
    }
}

fn outgoing_headers(headers: &HeaderMap, credentials: Credentials, same_origin: bool) -> HeaderMap {
    let mut headers = headers.clone();
    let send_credentials = match credentials {
        Credentials::Omit => false,
        Credentials::SameOrigin => same_origin,
        Credentials::Include => true,
    };
    if !send_credentials {
        headers.remove(COOKIE);
        headers.remove(AUTHORIZATION);
    }
    headers
}

fn map_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Offline
    } else if error.is_builder() {
        FetchError::InvalidUrl {
            url: error
                .url()
                .map(|url| url.to_string())
                .unwrap_or_default(),
        }
    } else {
        FetchError::network(error)
    }
}

#[async_trait]
impl Fetch for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = self.absolute_url(request.uri())?;
        let same_origin = self.is_same_origin(&url);
        let headers = outgoing_headers(request.headers(), request.credentials(), same_origin);
        let kind = self.response_type(request.mode(), same_origin);

        debug!(method = %request.method(), url = %url, same_origin, "network fetch");

        let response = self
            .client
            .request(request.method().clone(), &url)
            .headers(headers)
            .send()
            .await
            .map_err(map_error)?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_error)?;

        Ok(FetchResponse::new(status, body)
            .with_headers(response_headers)
            .with_kind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn fetcher() -> ReqwestFetcher {
        ReqwestFetcher::new(reqwest::Client::new())
            .with_origin("https://marquee.app/index.html".parse().unwrap())
    }

    #[test]
    fn relative_url_resolves_against_origin() {
        let url = fetcher()
            .absolute_url(&"/assets/app.js?v=3".parse().unwrap())
            .unwrap();
        assert_eq!(url, "https://marquee.app/assets/app.js?v=3");
    }

    #[test]
    fn relative_url_without_origin_is_invalid() {
        let bare = ReqwestFetcher::new(reqwest::Client::new());
        assert!(matches!(
            bare.absolute_url(&"/index.html".parse().unwrap()),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn omit_strips_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sid=1"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert("x-client", HeaderValue::from_static("marquee"));

        let out = outgoing_headers(&headers, Credentials::Omit, true);
        assert!(out.get(COOKIE).is_none());
        assert!(out.get(AUTHORIZATION).is_none());
        assert_eq!(out.get("x-client").unwrap(), "marquee");

        let out = outgoing_headers(&headers, Credentials::SameOrigin, true);
        assert!(out.get(COOKIE).is_some());
        let out = outgoing_headers(&headers, Credentials::SameOrigin, false);
        assert!(out.get(COOKIE).is_none());
    }

    #[test]
    fn cross_origin_no_cors_is_opaque() {
        let fetcher = fetcher();
        assert!(fetcher.is_same_origin("https://marquee.app/a"));
        assert!(!fetcher.is_same_origin("https://image.tmdb.org/a.jpg"));
        assert_eq!(
            fetcher.response_type(RequestMode::NoCors, false),
            ResponseType::Opaque
        );
        assert_eq!(
            fetcher.response_type(RequestMode::Cors, false),
            ResponseType::Cors
        );
        assert_eq!(
            fetcher.response_type(RequestMode::NoCors, true),
            ResponseType::Basic
        );
    }
}
