use std::future::Future;

use url::Url;

use super::Call;
use crate::coerce::FromResponse;
use crate::config::{ClientConfig, ClientOptions, Endpoint};
use crate::error::Error;
use crate::executor::{execute_async, ClientCore};
use crate::http::HttpMethod;
use crate::scope;
use crate::timeout::Timeout;
use crate::transport::{AsyncTransport, ReqwestAsync};

/// REST client for async code. Calls suspend only on network I/O, and any
/// number of them may be in flight on one client.
///
/// The session is closed when the client is dropped or passed to
/// [`close`](Self::close).
#[derive(Debug)]
pub struct AsyncClient<T = ReqwestAsync> {
    core: ClientCore,
    transport: T,
}

impl AsyncClient {
    pub fn new(endpoint: &Endpoint, options: ClientOptions) -> Result<Self, Error> {
        let transport = ReqwestAsync::new(&options)?;
        Self::with_transport(endpoint, options, transport)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        Self::new(&config.endpoint, config.options.clone())
    }
}

impl<T: AsyncTransport> AsyncClient<T> {
    pub fn with_transport(endpoint: &Endpoint, options: ClientOptions, transport: T) -> Result<Self, Error> {
        let core = ClientCore::new(endpoint, options)?;
        tracing::debug!(base_url = %core.base_url(), "Opened async HTTP session");
        Ok(Self { core, transport })
    }

    pub fn base_url(&self) -> &Url {
        self.core.base_url()
    }

    pub fn get(&self, path: &str) -> Call<'_, Self> {
        Call::new(self, HttpMethod::Get, path)
    }

    pub fn post(&self, path: &str) -> Call<'_, Self> {
        Call::new(self, HttpMethod::Post, path)
    }

    pub fn put(&self, path: &str) -> Call<'_, Self> {
        Call::new(self, HttpMethod::Put, path)
    }

    pub fn delete(&self, path: &str) -> Call<'_, Self> {
        Call::new(self, HttpMethod::Delete, path)
    }

    pub fn set_bearer_token(&mut self, token: &str) -> Result<(), Error> {
        self.core.set_auth_token("Bearer", token)
    }

    pub fn set_auth_token(&mut self, scheme: &str, token: &str) -> Result<(), Error> {
        self.core.set_auth_token(scheme, token)
    }

    pub fn set_auth_basic(&mut self, username: &str, password: &str) -> Result<(), Error> {
        self.core.set_auth_basic(username, password)
    }

    /// Run `future` with `timeout` applied to every request it makes.
    /// Tasks spawned from inside do not inherit the override.
    ///
    /// ```rust,ignore
    /// client
    ///     .with_timeout(Timeout::total(Duration::from_secs(10)), async {
    ///         pets.ping().await
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_timeout<F: Future>(&self, timeout: Timeout, future: F) -> F::Output {
        scope::task_scope(timeout, future).await
    }

    /// Close the session, releasing its pooled connections.
    pub async fn close(self) {
        let Self { core, transport } = self;
        tracing::debug!(base_url = %core.base_url(), "Closing async HTTP session");
        drop(transport);
    }
}

impl<T: AsyncTransport> Call<'_, AsyncClient<T>> {
    /// Send the request and coerce the response into `R`.
    pub async fn send<R: FromResponse>(self) -> Result<R, Error> {
        let request = self.client.core.prepare(
            self.method,
            &self.path,
            self.body?,
            self.query,
            self.timeout,
            scope::task_timeout(),
        )?;
        execute_async(&self.client.transport, request).await
    }
}
