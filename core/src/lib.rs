//! REST-minded HTTP client with blocking and async façades.
//!
//! # Overview
//! Callers issue GET/POST/PUT/DELETE requests against an API base URL,
//! send a body in one of several shapes, and get the response decoded and
//! coerced into the type they ask for. Timeouts, TLS options and errors
//! behave the same in both execution modes.
//!
//! ```rust,ignore
//! use http_noah::{BlockingClient, ClientOptions, Endpoint, Model};
//!
//! #[derive(serde::Deserialize)]
//! struct Pet { name: String }
//! impl Model for Pet {}
//!
//! let client = BlockingClient::new(&Endpoint::new("localhost").port(8080), ClientOptions::default())?;
//! let pet: Pet = client.get("/pets/1").send()?;
//! client.delete("/pets/1").send::<()>()?;
//! ```
//!
//! # Design
//! - The pipeline (`body` → `timeout` → transport → `decode` → `coerce`)
//!   is synchronous plain-data code in `executor`; only the transport call
//!   differs between the blocking and async façades.
//! - The result type picks the decoding path through [`FromResponse`],
//!   so there is no runtime type reflection.
//! - Scoped timeout overrides live in thread-local (blocking) or
//!   task-local (async) storage and never leak between concurrent calls.

pub mod body;
pub mod client;
pub mod coerce;
pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
pub mod http;
pub mod scope;
pub mod timeout;
pub mod transport;

pub use crate::body::{RequestBody, UploadFile};
pub use crate::client::{AsyncClient, BlockingClient, Call};
pub use crate::coerce::{FromResponse, Model, ResponseKind};
pub use crate::config::{ClientConfig, ClientOptions, Endpoint};
pub use crate::error::Error;
pub use crate::http::{HttpMethod, PreparedRequest, RawResponse};
pub use crate::scope::TimeoutScope;
pub use crate::timeout::{Timeout, Total};
pub use crate::transport::{AsyncTransport, BlockingTransport, ReqwestAsync, ReqwestBlocking};
