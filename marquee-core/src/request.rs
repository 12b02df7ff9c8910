//! Intercepted request type.
//!
//! [`FetchRequest`] carries the parts of an outgoing request that routing and
//! caching decisions look at: method, URL, headers, plus the fetch metadata a
//! browser attaches (mode, destination, credentials policy).

use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use smol_str::SmolStr;

/// How the request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Same-origin only.
    SameOrigin,
    /// Cross-origin request that expects CORS headers.
    #[default]
    Cors,
    /// Cross-origin request that yields an opaque response.
    NoCors,
}

/// What the response is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Destination {
    /// A document (navigation target or iframe).
    Document,
    /// An `<img>` or CSS image.
    Image,
    /// A script.
    Script,
    /// A stylesheet.
    Style,
    /// A web font.
    Font,
    /// `fetch()` / XHR with no specific destination.
    #[default]
    Empty,
}

/// Whether cookies and authorization headers travel with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Credentials {
    /// Never send credentials.
    Omit,
    /// Send credentials to the same origin only.
    #[default]
    SameOrigin,
    /// Always send credentials.
    Include,
}

/// A request intercepted by the worker.
///
/// # Example
///
/// ```
/// use marquee_core::{Destination, FetchRequest};
///
/// let request = FetchRequest::image("https://image.tmdb.org/t/p/w500/poster.jpg".parse()?);
/// assert_eq!(request.destination(), Destination::Image);
/// assert_eq!(request.cache_key().as_str(), "https://image.tmdb.org/t/p/w500/poster.jpg");
/// # Ok::<(), http::uri::InvalidUri>(())
/// ```
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    mode: RequestMode,
    destination: Destination,
    credentials: Credentials,
}

impl FetchRequest {
    /// Creates a `GET` request with default fetch metadata.
    pub fn get(uri: Uri) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Creates a request with the given method and default fetch metadata.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            mode: RequestMode::default(),
            destination: Destination::default(),
            credentials: Credentials::default(),
        }
    }

    /// Creates a document navigation to `uri`.
    pub fn navigate(uri: Uri) -> Self {
        Self::get(uri)
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document)
    }

    /// Creates an image load, as issued by an `<img>` element.
    pub fn image(uri: Uri) -> Self {
        Self::get(uri)
            .with_mode(RequestMode::NoCors)
            .with_destination(Destination::Image)
    }

    /// Sets the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the request destination.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Sets the credentials policy.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Request mode.
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Request destination.
    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Credentials policy.
    pub fn credentials(&self) -> Credentials {
        self.credentials
    }

    /// Returns `true` for top-level document navigations.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// The key this request is stored under inside a namespace.
    ///
    /// Only the full URL is significant; headers and fetch metadata are not.
    pub fn cache_key(&self) -> SmolStr {
        SmolStr::new(self.uri.to_string())
    }
}
