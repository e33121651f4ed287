//! Client façades, one per execution mode.
//!
//! `BlockingClient` and `AsyncClient` expose the same verbs and return the
//! same errors. Each verb returns a [`Call`] that collects the optional
//! parts of a request; its terminal `send` is provided by the façade's
//! mode.

mod blocking;
mod nonblocking;

pub use blocking::BlockingClient;
pub use nonblocking::AsyncClient;

use serde::Serialize;

use crate::body::RequestBody;
use crate::error::Error;
use crate::http::HttpMethod;
use crate::timeout::Timeout;

/// A request under construction, bound to the client that will send it.
#[must_use = "a call does nothing until it is sent"]
#[derive(Debug)]
pub struct Call<'c, C> {
    client: &'c C,
    method: HttpMethod,
    path: String,
    body: Result<RequestBody, Error>,
    query: Vec<(String, String)>,
    timeout: Option<Timeout>,
}

impl<'c, C> Call<'c, C> {
    pub(crate) fn new(client: &'c C, method: HttpMethod, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            body: Ok(RequestBody::Empty),
            query: Vec::new(),
            timeout: None,
        }
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Ok(body.into());
        self
    }

    /// Send `model` as JSON produced by its own `Serialize` impl. A
    /// serialization failure is reported by `send`.
    pub fn model<M: Serialize + ?Sized>(mut self, model: &M) -> Self {
        self.body = RequestBody::model(model);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Overrides both the ambient scope and the client default.
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
