use url::Url;

use super::Call;
use crate::coerce::FromResponse;
use crate::config::{ClientConfig, ClientOptions, Endpoint};
use crate::error::Error;
use crate::executor::{execute_blocking, ClientCore};
use crate::http::HttpMethod;
use crate::scope::{self, TimeoutScope};
use crate::timeout::Timeout;
use crate::transport::{BlockingTransport, ReqwestBlocking};

/// REST client for blocking code. Every call occupies the calling thread
/// until the response is decoded.
///
/// The session is closed when the client is dropped or passed to
/// [`close`](Self::close). Constructing it inside an async runtime fails;
/// use [`AsyncClient`](super::AsyncClient) there.
#[derive(Debug)]
pub struct BlockingClient<T = ReqwestBlocking> {
    core: ClientCore,
    transport: T,
}

impl BlockingClient {
    pub fn new(endpoint: &Endpoint, options: ClientOptions) -> Result<Self, Error> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::Configuration(
                "BlockingClient cannot be used inside an async runtime, use AsyncClient".to_string(),
            ));
        }
        let transport = ReqwestBlocking::new(&options)?;
        Self::with_transport(endpoint, options, transport)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        Self::new(&config.endpoint, config.options.clone())
    }
}

impl<T: BlockingTransport> BlockingClient<T> {
    pub fn with_transport(endpoint: &Endpoint, options: ClientOptions, transport: T) -> Result<Self, Error> {
        let core = ClientCore::new(endpoint, options)?;
        tracing::debug!(base_url = %core.base_url(), "Opened blocking HTTP session");
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

    /// Apply `timeout` to every request made on this thread while the
    /// returned guard is alive.
    ///
    /// ```rust,ignore
    /// let _scope = client.timeout(Timeout::total(Duration::from_secs(10)));
    /// pets.ping()?;
    /// ```
    pub fn timeout(&self, timeout: Timeout) -> TimeoutScope {
        TimeoutScope::enter(timeout)
    }

    /// Run `f` with `timeout` as the ambient override.
    pub fn with_timeout<R>(&self, timeout: Timeout, f: impl FnOnce() -> R) -> R {
        let _scope = TimeoutScope::enter(timeout);
        f()
    }

    /// Close the session, releasing its pooled connections.
    pub fn close(self) {
        let Self { core, transport } = self;
        tracing::debug!(base_url = %core.base_url(), "Closing blocking HTTP session");
        drop(transport);
    }
}

impl<T: BlockingTransport> Call<'_, BlockingClient<T>> {
    /// Send the request and coerce the response into `R`.
    pub fn send<R: FromResponse>(self) -> Result<R, Error> {
        let request = self.client.core.prepare(
            self.method,
            &self.path,
            self.body?,
            self.query,
            self.timeout,
            scope::thread_timeout(),
        )?;
        execute_blocking(&self.client.transport, request)
    }
}
