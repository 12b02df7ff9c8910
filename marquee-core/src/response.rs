//! Response type returned to the page.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::Raw;

/// How much of the response the page is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseType {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response with CORS headers.
    Cors,
    /// Cross-origin `no-cors` response. Its status reads as `0`.
    Opaque,
}

/// A response produced by the network or read back from a namespace.
///
/// Bodies are fully buffered; cloning a response only bumps the body's
/// reference count.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Raw,
    kind: ResponseType,
}

impl FetchResponse {
    /// Creates a basic response.
    pub fn new(status: StatusCode, body: impl Into<Raw>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            kind: ResponseType::Basic,
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok(body: impl Into<Raw>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates an opaque response as produced by a `no-cors` cross-origin request.
    pub fn opaque(body: impl Into<Raw>) -> Self {
        Self::ok(body).with_kind(ResponseType::Opaque)
    }

    /// Sets the response type.
    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The underlying HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The status as the page observes it: `0` for opaque responses.
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ResponseType::Opaque => 0,
            _ => self.status.as_u16(),
        }
    }

    /// Returns `true` for a visible 2xx response.
    pub fn is_ok(&self) -> bool {
        self.kind != ResponseType::Opaque && self.status.is_success()
    }

    /// Returns `true` for opaque responses.
    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseType::Opaque
    }

    /// Response type.
    pub fn kind(&self) -> ResponseType {
        self.kind
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    pub fn body(&self) -> &Raw {
        &self.body
    }

    /// Consumes the response and returns its body.
    pub fn into_body(self) -> Raw {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_status_reads_as_zero() {
        let response = FetchResponse::opaque("img");
        assert_eq!(response.status_code(), 0);
        assert!(!response.is_ok());
        assert!(response.is_opaque());
    }

    #[test]
    fn basic_ok() {
        let response = FetchResponse::ok("{}");
        assert_eq!(response.status_code(), 200);
        assert!(response.is_ok());
    }

    #[test]
    fn server_error_is_not_ok() {
        let response = FetchResponse::new(StatusCode::BAD_GATEWAY, "");
        assert!(!response.is_ok());
        assert_eq!(response.status_code(), 502);
    }
}
