//! Response decoding driven by status code and content type.

use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;

use crate::error::Error;
use crate::http::RawResponse;

static JSON_CONTENT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^application/(?:[\w.+-]+?\+)?json").expect("JSON media type pattern is valid")
});

/// A response body decoded into its wire shape, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// 204 No Content.
    Empty,
    Json(serde_json::Value),
    Bytes(Bytes),
    Text(String),
}

impl Decoded {
    /// Short name of the shape, used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Decoded::Empty => "no content",
            Decoded::Json(value) => json_kind(value),
            Decoded::Bytes(_) => "bytes",
            Decoded::Text(_) => "text",
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "JSON null",
        serde_json::Value::Bool(_) => "JSON boolean",
        serde_json::Value::Number(_) => "JSON number",
        serde_json::Value::String(_) => "JSON string",
        serde_json::Value::Array(_) => "JSON array",
        serde_json::Value::Object(_) => "JSON object",
    }
}

/// Whether `content_type` names JSON, including structured syntax
/// suffixes such as `application/vnd.api+json`.
pub fn is_json(content_type: &str) -> bool {
    JSON_CONTENT_TYPE.is_match(content_type)
}

/// Decode a successful response. The first matching rule wins: 204, JSON
/// content type, caller expects bytes, text.
pub fn decode(response: &RawResponse, expects_bytes: bool) -> Result<Decoded, Error> {
    if response.status == 204 {
        return Ok(Decoded::Empty);
    }
    if response.content_type().is_some_and(is_json) {
        return serde_json::from_slice(&response.body)
            .map(Decoded::Json)
            .map_err(Error::Decode);
    }
    if expects_bytes {
        return Ok(Decoded::Bytes(response.body.clone()));
    }
    Ok(Decoded::Text(text(response)))
}

/// Body as text, using the declared charset and falling back to UTF-8.
pub fn text(response: &RawResponse) -> String {
    let encoding = response
        .content_type()
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .and_then(|mime| {
            mime.get_param(mime::CHARSET)
                .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_str().as_bytes()))
        })
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(&response.body);
    text.into_owned()
}
