//! Client configuration: where the API lives and how to talk to it.
//!
//! # Design
//! All types deserialize with `serde`, so a host application can keep them
//! in its own config file. Durations are written as fractional seconds:
//!
//! ```toml
//! [endpoint]
//! host = "pets.example.com"
//! port = 443
//! scheme = "https"
//!
//! [options]
//! tls_verify = true
//! timeout = { connect = 0.5, read = 10 }
//! ```
//!
//! `total = false` (or `total = "none"`) removes the end-to-end limit.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::Error;
use crate::timeout::{Timeout, Total};

fn default_port() -> u16 {
    80
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_api_base() -> String {
    "/api/v1".to_string()
}

fn default_tls_verify() -> bool {
    true
}

/// Location of the API. The base URL is composed once from these parts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            scheme: default_scheme(),
            api_base: default_api_base(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build an endpoint from an absolute URL; its path becomes the API base.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let parsed = Url::parse(url).map_err(|e| Error::Configuration(format!("invalid endpoint URL {url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::Configuration(format!("endpoint URL {url} has no host")))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| Error::Configuration(format!("endpoint URL {url} has no port")))?;
        Ok(Self {
            host: host.to_string(),
            port,
            scheme: parsed.scheme().to_string(),
            api_base: parsed.path().to_string(),
        })
    }

    /// Absolute base URL, always ending with `/` so paths join below it.
    pub fn base_url(&self) -> Result<Url, Error> {
        let base = format!(
            "{}://{}:{}/{}",
            self.scheme,
            self.host,
            self.port,
            self.api_base.trim_matches('/')
        );
        let mut url = Url::parse(&base).map_err(|e| Error::Configuration(format!("invalid base URL {base}: {e}")))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

/// Per-client options, read on every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientOptions {
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
    #[serde(default)]
    pub timeout: Timeout,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            tls_verify: default_tls_verify(),
            timeout: Timeout::default(),
        }
    }
}

impl ClientOptions {
    pub fn tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Endpoint and options together, as loaded from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    #[serde(default)]
    pub options: ClientOptions,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TimeoutSecs {
    total: Option<TotalSecs>,
    connect: Option<f64>,
    read: Option<f64>,
}

/// `total` in config form: seconds, or `false` / `"none"` for no limit.
#[derive(Deserialize)]
#[serde(untagged)]
enum TotalSecs {
    Seconds(f64),
    Enabled(bool),
    Keyword(String),
}

impl TotalSecs {
    fn into_total<E: serde::de::Error>(self) -> Result<Total, E> {
        match self {
            TotalSecs::Seconds(secs) => Ok(seconds::<E>(Some(secs))?.map_or(Total::Default, Total::Limit)),
            TotalSecs::Enabled(false) => Ok(Total::Unlimited),
            TotalSecs::Keyword(word) if word.eq_ignore_ascii_case("none") => Ok(Total::Unlimited),
            TotalSecs::Enabled(true) => Err(E::custom("total = true is not a duration")),
            TotalSecs::Keyword(word) => Err(E::custom(format!("invalid total timeout {word:?}"))),
        }
    }
}

fn seconds<E: serde::de::Error>(secs: Option<f64>) -> Result<Option<Duration>, E> {
    secs.map(|s| Duration::try_from_secs_f64(s).map_err(|e| E::custom(format!("invalid duration {s}: {e}"))))
        .transpose()
}

impl<'de> Deserialize<'de> for Timeout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = TimeoutSecs::deserialize(deserializer)?;
        Ok(Timeout {
            total: match raw.total {
                Some(total) => total.into_total::<D::Error>()?,
                None => Total::Default,
            },
            connect: seconds::<D::Error>(raw.connect)?,
            read: seconds::<D::Error>(raw.read)?,
        })
    }
}
