//! Error types for the REST client.
//!
//! # Design
//! Both façades surface the same `Error` for the same failure condition.
//! Transport-specific errors are normalized at the transport boundary so
//! callers never match on `reqwest` types. Non-2xx responses keep the raw
//! body text, captured before the connection is released.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the client pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection could not be established or was lost (DNS failure,
    /// refused connection, reset, TLS handshake).
    #[error("connection error: {0}")]
    Connection(String),

    /// A connect, read or total deadline expired.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server replied with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The decoded response does not have the shape the caller asked for.
    #[error("expected {expected} but got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The decoded value failed structured-model validation. `raw` is the
    /// value as it came off the wire.
    #[error("failed to parse {model}: {reason}")]
    Validation {
        model: &'static str,
        reason: String,
        raw: serde_json::Value,
    },

    /// The response declared a JSON content type but the body is not JSON.
    #[error("invalid JSON response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The file bound to an upload body could not be read.
    #[error("cannot read upload file {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request could not be built: bad URL, unserializable body,
    /// invalid header, or a façade used in the wrong execution mode.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Status code of an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Normalize a `reqwest` failure. Timeouts are checked first because
    /// a connect timeout is also flagged as a connect error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else if err.is_builder() {
            Error::Configuration(err.to_string())
        } else {
            Error::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_exposes_status_and_body() {
        let err = Error::Http {
            status: 404,
            body: "No such pet".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: No such pet");
    }

    #[test]
    fn type_mismatch_names_both_types() {
        let err = Error::TypeMismatch {
            expected: "integer",
            found: "text",
        };
        assert_eq!(err.to_string(), "expected integer but got text");
        assert!(err.status().is_none());
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::Timeout("deadline".into()).is_timeout());
        assert!(Error::Connection("refused".into()).is_connection());
        assert!(!Error::Configuration("bad".into()).is_timeout());
    }
}
