//! Request bodies and their encoding into transport-ready payloads.
//!
//! # Design
//! `RequestBody` is the closed set of shapes a caller may send. [`encode`]
//! turns it into an [`EncodedBody`], which is still plain data: transports
//! map each variant onto their native body mechanism. Upload files are
//! only described here; the transport opens them so the handle lives
//! exactly as long as the request.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;

use crate::error::Error;

/// Content type sent with model bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// A file sent as a multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub field: String,
    pub path: PathBuf,
}

impl UploadFile {
    pub const DEFAULT_MIME_TYPE: &'static str = "application/octet-stream";

    pub fn new(field: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            field: field.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// MIME type guessed from the file extension.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| Self::DEFAULT_MIME_TYPE.to_string())
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// JSON produced by the model's own `Serialize` impl.
    Model(Bytes),
    /// Raw JSON structure, serialized by the transport.
    Json(serde_json::Value),
    /// Flat mapping sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    Upload(UploadFile),
    Text(String),
    Bytes(Bytes),
}

impl RequestBody {
    /// Serialize a structured model.
    pub fn model<T: Serialize + ?Sized>(model: &T) -> Result<Self, Error> {
        serde_json::to_vec(model)
            .map(|json| RequestBody::Model(Bytes::from(json)))
            .map_err(|e| Error::Configuration(format!("cannot serialize model body: {e}")))
    }

    pub fn form<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RequestBody::Form(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<UploadFile> for RequestBody {
    fn from(upload: UploadFile) -> Self {
        RequestBody::Upload(upload)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(data: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(data))
    }
}

impl From<Bytes> for RequestBody {
    fn from(data: Bytes) -> Self {
        RequestBody::Bytes(data)
    }
}

/// Multipart file field, ready for the transport to open and stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
}

/// Transport-ready payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedBody {
    None,
    /// Literal payload, with an explicit content type when one is required.
    Raw {
        content_type: Option<&'static str>,
        data: Bytes,
    },
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart(FilePart),
}

impl fmt::Display for EncodedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedBody::None => write!(f, "none"),
            EncodedBody::Raw { content_type, data } => {
                write!(f, "{} bytes ({})", data.len(), content_type.unwrap_or("raw"))
            }
            EncodedBody::Json(value) => write!(f, "json {value}"),
            EncodedBody::Form(fields) => write!(f, "form with {} fields", fields.len()),
            EncodedBody::Multipart(part) => {
                write!(f, "upload {}={} ({})", part.field, part.path.display(), part.mime_type)
            }
        }
    }
}

/// Turn a request body into transport payload parameters. Runs before
/// any network I/O.
pub fn encode(body: RequestBody) -> Result<EncodedBody, Error> {
    let encoded = match body {
        RequestBody::Empty => EncodedBody::None,
        RequestBody::Model(json) => EncodedBody::Raw {
            content_type: Some(APPLICATION_JSON),
            data: json,
        },
        RequestBody::Json(value) => EncodedBody::Json(value),
        RequestBody::Form(fields) => EncodedBody::Form(fields),
        RequestBody::Text(text) => EncodedBody::Raw {
            content_type: None,
            data: Bytes::from(text),
        },
        RequestBody::Bytes(data) => EncodedBody::Raw {
            content_type: None,
            data,
        },
        RequestBody::Upload(upload) => {
            let file_name = upload
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::Configuration(format!("upload path {} has no file name", upload.path.display()))
                })?;
            let mime_type = upload.mime_type();
            EncodedBody::Multipart(FilePart {
                field: upload.field,
                path: upload.path,
                file_name,
                mime_type,
            })
        }
    };
    Ok(encoded)
}
