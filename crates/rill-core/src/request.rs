//! HTTP Request types

use crate::Method;
use rill_router::{extract_query, Params, Query};
use smallvec::SmallVec;

/// HTTP Request as seen by the dispatch engine
///
/// `params` starts empty and is filled as routers match; `query` is parsed
/// once from the request target and never changes during dispatch.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string or fragment)
    pub path: String,
    /// Raw query string (without leading ?)
    pub raw_query: Option<String>,
    /// Fragment (without leading #)
    pub hash: Option<String>,
    /// Request headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 16]>,
    /// Request body
    pub body: bytes::Bytes,
    /// Route parameters accumulated by matching routers
    pub params: Params,
    /// Path consumed by the mounts above the router currently dispatching
    pub base_path: String,
    /// Path the router currently dispatching matches against
    pub remaining_path: String,
    /// Parsed query string
    pub query: Query,
}

impl Request {
    /// Create a request from a method and a request target (`/path?query#hash`)
    pub fn new(method: Method, target: impl AsRef<str>) -> Self {
        let target = target.as_ref();
        let (rest, hash) = match target.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash.to_string())),
            None => (target, None),
        };
        let (path, raw_query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        let path = if path.is_empty() { "/" } else { path };

        Self {
            method,
            path: path.to_string(),
            raw_query,
            hash,
            headers: SmallVec::new(),
            body: bytes::Bytes::new(),
            params: Params::new(),
            base_path: "/".to_string(),
            remaining_path: path.to_string(),
            query: extract_query(target),
        }
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get content-type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get a route parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Merge parameters from a match, overwriting same-named ones
    pub(crate) fn merge_params(&mut self, params: Params) {
        self.params.extend(params);
    }
}

/// Builder for constructing requests
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Create a new builder
    pub fn new(method: Method, target: impl AsRef<str>) -> Self {
        Self {
            request: Request::new(method, target),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Set body
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.request.body = body.into();
        self
    }

    /// Build the request
    pub fn build(self) -> Request {
        self.request
    }
}
