//! HTTP exchange described as plain data.
//!
//! # Design
//! The pipeline builds a `PreparedRequest` and consumes a `RawResponse`
//! without touching the network; a transport executes the round-trip in
//! between. `RawResponse` carries the complete body, so nothing is lost
//! when the transport releases the connection.

use std::fmt;

use bytes::Bytes;
use http::HeaderMap;
use url::Url;

use crate::body::EncodedBody;
use crate::timeout::TransportTimeout;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
        }
    }
}

/// A fully resolved request, ready for a transport.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: EncodedBody,
    pub timeout: TransportTimeout,
}

/// A response with its body already read into memory.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `Content-Type` header, if present and valid ASCII.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    use super::*;

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(http::Method::from(HttpMethod::Put), http::Method::PUT);
    }

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let response = RawResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };
        assert!(response.is_success());
        assert_eq!(response.content_type(), Some("text/plain"));
        assert!(response.headers.contains_key("Content-Type"));
    }

    #[test]
    fn non_2xx_is_not_success() {
        let response = RawResponse {
            status: 404,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        assert!(!response.is_success());
        assert_eq!(response.content_type(), None);
    }
}
