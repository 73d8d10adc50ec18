//! The parts of an inbound request the binding resolver reads.

use bytes::Bytes;
use hermes_router::Params;

/// A routed request as seen by [`decode`](crate::decode): the placeholder
/// values the router captured, the raw query string and the body.
///
/// Headers and the method stay with the server; they never feed field
/// binding.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use hermes_extract::RawRequest;
/// use hermes_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let raw = RawRequest::new(params, Some("path=%2Fhome"), Bytes::new());
/// assert_eq!(raw.params().get("id"), Some("123"));
/// assert_eq!(raw.query(), "path=%2Fhome");
/// assert!(!raw.has_body());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    params: Params,
    query: Option<String>,
    body: Bytes,
}

impl RawRequest {
    /// Creates a raw request from its routed parts.
    #[must_use]
    pub fn new(params: Params, query: Option<&str>, body: Bytes) -> Self {
        Self {
            params,
            query: query.map(str::to_owned),
            body,
        }
    }

    /// Takes the query and body of a transport request routed to `params`.
    #[must_use]
    pub fn from_request(request: &http::Request<Bytes>, params: Params) -> Self {
        Self::new(params, request.uri().query(), request.body().clone())
    }

    /// Placeholder values captured by the router, still percent-encoded.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The query string without the leading `?`; empty when absent.
    #[must_use]
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    /// The body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// `false` for an absent or whitespace-only body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.iter().all(u8::is_ascii_whitespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_keeps_query_and_body() {
        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri("/api/projects?dry=true")
            .header("project", "p-1")
            .body(Bytes::from_static(b"  \n"))
            .unwrap();

        let raw = RawRequest::from_request(&request, Params::new());
        assert_eq!(raw.query(), "dry=true");
        assert!(!raw.has_body());
        assert!(raw.params().is_empty());
    }

    #[test]
    fn test_missing_query_reads_as_empty() {
        let raw = RawRequest::new(Params::new(), None, Bytes::from_static(b"{}"));
        assert_eq!(raw.query(), "");
        assert!(raw.has_body());
    }
}
