//! Request execution pipeline shared by both façades.
//!
//! # Design
//! Every step except the network round-trip is plain synchronous code:
//! [`ClientCore::prepare`] resolves the URL, timeout and body into a
//! `PreparedRequest`, and [`finish`] classifies, decodes and coerces the
//! `RawResponse`. The blocking and async entry points only differ in how
//! they wait for the transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderValue, AUTHORIZATION};
use http::HeaderMap;
use url::Url;

use crate::body::{encode, RequestBody};
use crate::coerce::{FromResponse, ResponseKind};
use crate::config::{ClientOptions, Endpoint};
use crate::decode::{decode, text};
use crate::error::Error;
use crate::http::{HttpMethod, PreparedRequest, RawResponse};
use crate::timeout::{resolve, Timeout};
use crate::transport::{AsyncTransport, BlockingTransport};

/// State shared by every request of one client: base URL, options and
/// default headers.
#[derive(Debug, Clone)]
pub struct ClientCore {
    base_url: Url,
    options: ClientOptions,
    headers: HeaderMap,
}

impl ClientCore {
    pub fn new(endpoint: &Endpoint, options: ClientOptions) -> Result<Self, Error> {
        Ok(Self {
            base_url: endpoint.base_url()?,
            options,
            headers: HeaderMap::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Send `Authorization: <scheme> <token>` with every request.
    pub fn set_auth_token(&mut self, scheme: &str, token: &str) -> Result<(), Error> {
        self.set_authorization(format!("{scheme} {token}"))
    }

    /// Send HTTP basic credentials with every request.
    pub fn set_auth_basic(&mut self, username: &str, password: &str) -> Result<(), Error> {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        self.set_authorization(format!("Basic {credentials}"))
    }

    fn set_authorization(&mut self, value: String) -> Result<(), Error> {
        let mut value = HeaderValue::try_from(value)
            .map_err(|e| Error::Configuration(format!("invalid authorization header: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Resolve an API path against the base URL. Leading slashes are
    /// stripped so the path always lands below the API base.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let relative = path.trim_start_matches('/');
        self.base_url
            .join(relative)
            .map_err(|e| Error::Configuration(format!("invalid request path {path}: {e}")))
    }

    /// Build a transport-ready request. `ambient` is the scoped override of
    /// the calling thread or task.
    pub fn prepare(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
        query: Vec<(String, String)>,
        timeout: Option<Timeout>,
        ambient: Option<Timeout>,
    ) -> Result<PreparedRequest, Error> {
        let request = PreparedRequest {
            method,
            url: self.url(path)?,
            headers: self.headers.clone(),
            query,
            body: encode(body)?,
            timeout: resolve(timeout, ambient, self.options.timeout),
        };
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            body = %request.body,
            query = ?request.query,
            timeout = ?request.timeout,
            "Performing request"
        );
        Ok(request)
    }
}

/// Classify, decode and coerce a response. Non-2xx responses become
/// `Error::Http` with the body text, which is logged first.
pub fn finish<T: FromResponse>(request: &PreparedRequest, response: RawResponse) -> Result<T, Error> {
    if !response.is_success() {
        let err_body = text(&response);
        tracing::error!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            err_body = %err_body,
            "Request failed"
        );
        return Err(Error::Http {
            status: response.status,
            body: err_body,
        });
    }
    let decoded = decode(&response, T::KIND == ResponseKind::Bytes)?;
    T::from_decoded(decoded)
}

fn log_transport_failure(request: &PreparedRequest, err: &Error) {
    tracing::error!(method = %request.method, url = %request.url, error = %err, "Request failed");
}

/// Run one request through a blocking transport.
pub fn execute_blocking<T, Tr>(transport: &Tr, request: PreparedRequest) -> Result<T, Error>
where
    T: FromResponse,
    Tr: BlockingTransport + ?Sized,
{
    match transport.send(&request) {
        Ok(response) => finish(&request, response),
        Err(err) => {
            log_transport_failure(&request, &err);
            Err(err)
        }
    }
}

/// Run one request through an async transport. The only suspension point
/// is the transport call.
pub async fn execute_async<T, Tr>(transport: &Tr, request: PreparedRequest) -> Result<T, Error>
where
    T: FromResponse,
    Tr: AsyncTransport + ?Sized,
{
    match transport.send(&request).await {
        Ok(response) => finish(&request, response),
        Err(err) => {
            log_transport_failure(&request, &err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use bytes::Bytes;
    use http::header::CONTENT_TYPE;
    use serde::Deserialize;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::body::EncodedBody;
    use crate::coerce::Model;
    use crate::timeout::{TransportTimeout, DEFAULT_TOTAL};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet {
        name: String,
    }

    impl Model for Pet {}

    /// Replies with a canned response and remembers what it was sent.
    struct StubTransport {
        reply: Result<RawResponse, fn() -> Error>,
        seen: Mutex<Vec<PreparedRequest>>,
    }

    impl StubTransport {
        fn replying(status: u16, content_type: &'static str, body: &'static [u8]) -> Self {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            Self {
                reply: Ok(RawResponse {
                    status,
                    headers,
                    body: Bytes::from_static(body),
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: fn() -> Error) -> Self {
            Self {
                reply: Err(err),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn reply(&self, request: &PreparedRequest) -> Result<RawResponse, Error> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(response) => Ok(response.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    impl BlockingTransport for StubTransport {
        fn send(&self, request: &PreparedRequest) -> Result<RawResponse, Error> {
            self.reply(request)
        }
    }

    impl AsyncTransport for StubTransport {
        async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, Error> {
            self.reply(request)
        }
    }

    fn core() -> ClientCore {
        ClientCore::new(&Endpoint::new("localhost").port(8080), ClientOptions::default()).unwrap()
    }

    fn get(core: &ClientCore, path: &str) -> PreparedRequest {
        core.prepare(HttpMethod::Get, path, RequestBody::Empty, Vec::new(), None, None)
            .unwrap()
    }

    #[test]
    fn url_strips_leading_slashes() {
        let core = core();
        assert_eq!(core.url("/pets/1").unwrap().as_str(), "http://localhost:8080/api/v1/pets/1");
        assert_eq!(core.url("//pets").unwrap().as_str(), "http://localhost:8080/api/v1/pets");
        assert_eq!(core.url("pets").unwrap().as_str(), "http://localhost:8080/api/v1/pets");
    }

    #[test]
    fn prepare_merges_timeout_and_encodes_body() {
        let core = ClientCore::new(
            &Endpoint::new("localhost"),
            ClientOptions::default().timeout(Timeout::total(Duration::from_secs(7))),
        )
        .unwrap();

        let request = core
            .prepare(
                HttpMethod::Post,
                "/pets",
                RequestBody::from(json!({"name": "foo"})),
                vec![("limit".to_string(), "1".to_string())],
                None,
                Some(Timeout::total(Duration::from_secs(1))),
            )
            .unwrap();
        assert_eq!(request.timeout, TransportTimeout::Total(Some(Duration::from_secs(1))));
        assert_eq!(request.body, EncodedBody::Json(json!({"name": "foo"})));
        assert_eq!(request.query, vec![("limit".to_string(), "1".to_string())]);

        let request = get(&core, "/pets");
        assert_eq!(request.timeout, TransportTimeout::Total(Some(Duration::from_secs(7))));
    }

    #[test]
    fn default_options_use_library_timeout() {
        let request = get(&core(), "/pets");
        assert_eq!(request.timeout, TransportTimeout::Total(Some(DEFAULT_TOTAL)));
    }

    #[test]
    fn auth_headers_are_sent_with_every_request() {
        let mut core = core();
        core.set_auth_token("Bearer", "let-the-bear-in").unwrap();
        let request = get(&core, "/str");
        assert_eq!(request.headers[AUTHORIZATION], "Bearer let-the-bear-in");

        core.set_auth_basic("emu", "wars").unwrap();
        let request = get(&core, "/str");
        assert_eq!(request.headers[AUTHORIZATION], "Basic ZW11OndhcnM=");
        assert!(request.headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn invalid_auth_token_is_rejected() {
        let mut core = core();
        let err = core.set_auth_token("Bearer", "line\nbreak").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn model_from_json_response() {
        let transport = StubTransport::replying(200, "application/json", br#"{"name":"foo"}"#);
        let pet: Pet = execute_blocking(&transport, get(&core(), "/pets/1")).unwrap();
        assert_eq!(pet.name, "foo");
        assert_eq!(transport.seen.lock().unwrap()[0].method, HttpMethod::Get);
    }

    #[test]
    fn unit_result_rejects_non_empty_body() {
        let transport = StubTransport::replying(200, "application/json", br#"{"name":"foo"}"#);
        let err = execute_blocking::<(), _>(&transport, get(&core(), "/pets/1")).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn no_content_yields_unit() {
        let transport = StubTransport::replying(204, "text/plain", b"");
        execute_blocking::<(), _>(&transport, get(&core(), "/pets/1")).unwrap();
        let err = execute_blocking::<Pet, _>(&transport, get(&core(), "/pets/1")).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    #[traced_test]
    fn error_status_keeps_and_logs_body() {
        let transport = StubTransport::replying(404, "text/plain; charset=utf-8", b"No such pet");
        let err = execute_blocking::<Pet, _>(&transport, get(&core(), "/pets/2")).unwrap_err();
        assert!(matches!(err, Error::Http { status: 404, ref body } if body == "No such pet"));
        assert!(logs_contain("Request failed"));
        assert!(logs_contain("err_body=No such pet"));
    }

    #[test]
    #[traced_test]
    fn transport_failures_are_logged_and_returned() {
        let transport = StubTransport::failing(|| Error::Timeout("deadline elapsed".to_string()));
        let err = execute_blocking::<Pet, _>(&transport, get(&core(), "/pets/slow")).unwrap_err();
        assert!(err.is_timeout());
        assert!(logs_contain("deadline elapsed"));
    }

    #[test]
    fn bytes_requested_keeps_raw_body() {
        let transport = StubTransport::replying(200, "application/octet-stream", b"bin-boo");
        let data: Vec<u8> = execute_blocking(&transport, get(&core(), "/bytes")).unwrap();
        assert_eq!(data, b"bin-boo");
    }

    #[tokio::test]
    async fn async_pipeline_matches_blocking() {
        let transport = StubTransport::replying(200, "application/json", br#"{"name":"foo"}"#);
        let pet: Pet = execute_async(&transport, get(&core(), "/pets/1")).await.unwrap();
        assert_eq!(pet.name, "foo");

        let transport = StubTransport::replying(404, "text/plain", b"No such pet");
        let err = execute_async::<Pet, _>(&transport, get(&core(), "/pets/2")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
