//! Serialization of cached responses for byte-oriented backends.
//!
//! In-memory backends keep [`CachedResponse`] values as they are. Backends that
//! write to disk go through a [`Format`], which flattens the entry into a
//! [`StoredEntry`] first so every format sees the same serde shape.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use marquee_core::{CachedResponse, FetchResponse, ResponseType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod bincode;
mod json;

pub use bincode::BincodeFormat;
pub use json::JsonFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

impl FormatError {
    fn deserialize(message: impl Into<String>) -> Self {
        Self::Deserialize(message.into().into())
    }
}

/// Converts cached responses to bytes and back.
pub trait Format: std::fmt::Debug + Send + Sync {
    fn encode(&self, value: &CachedResponse) -> Result<Vec<u8>, FormatError>;

    fn decode(&self, data: &[u8]) -> Result<CachedResponse, FormatError>;
}

impl<T: Format + ?Sized> Format for Box<T> {
    fn encode(&self, value: &CachedResponse) -> Result<Vec<u8>, FormatError> {
        (**self).encode(value)
    }

    fn decode(&self, data: &[u8]) -> Result<CachedResponse, FormatError> {
        (**self).decode(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoredKind {
    Basic,
    Cors,
    Opaque,
}

impl From<ResponseType> for StoredKind {
    fn from(kind: ResponseType) -> Self {
        match kind {
            ResponseType::Basic => Self::Basic,
            ResponseType::Cors => Self::Cors,
            ResponseType::Opaque => Self::Opaque,
        }
    }
}

impl From<StoredKind> for ResponseType {
    fn from(kind: StoredKind) -> Self {
        match kind {
            StoredKind::Basic => Self::Basic,
            StoredKind::Cors => Self::Cors,
            StoredKind::Opaque => Self::Opaque,
        }
    }
}

/// Serde shape of a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    status: u16,
    kind: StoredKind,
    headers: Vec<(String, Vec<u8>)>,
    #[serde(with = "serde_bytes")]
    body: Vec<u8>,
    stored_at: DateTime<Utc>,
}

impl From<&CachedResponse> for StoredEntry {
    fn from(value: &CachedResponse) -> Self {
        let response = value.response();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), value.as_bytes().to_vec()))
            .collect();
        Self {
            status: response.status().as_u16(),
            kind: response.kind().into(),
            headers,
            body: response.body().to_vec(),
            stored_at: value.stored_at(),
        }
    }
}

impl TryFrom<StoredEntry> for CachedResponse {
    type Error = FormatError;

    fn try_from(entry: StoredEntry) -> Result<Self, Self::Error> {
        let status = StatusCode::from_u16(entry.status)
            .map_err(|err| FormatError::Deserialize(Box::new(err)))?;
        let mut headers = HeaderMap::with_capacity(entry.headers.len());
        for (name, value) in entry.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FormatError::deserialize(format!("invalid header name {name:?}")))?;
            let value = HeaderValue::from_bytes(&value)
                .map_err(|err| FormatError::Deserialize(Box::new(err)))?;
            headers.append(name, value);
        }
        let response = FetchResponse::new(status, Bytes::from(entry.body))
            .with_kind(entry.kind.into())
            .with_headers(headers);
        Ok(CachedResponse::new(response, entry.stored_at))
    }
}
