use std::sync::Arc;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};

use super::{BlockingTransport, Sessions};
use crate::body::{EncodedBody, FilePart};
use crate::config::ClientOptions;
use crate::error::Error;
use crate::http::{PreparedRequest, RawResponse};

/// Blocking transport over `reqwest::blocking::Client` sessions.
#[derive(Debug, Clone)]
pub struct ReqwestBlocking {
    tls_verify: bool,
    sessions: Arc<Sessions<Client>>,
}

impl ReqwestBlocking {
    pub fn new(options: &ClientOptions) -> Result<Self, Error> {
        let client = Self::session(options.tls_verify, None, None)?;
        Ok(Self {
            tls_verify: options.tls_verify,
            sessions: Arc::new(Sessions::new(client)),
        })
    }

    /// The blocking builder has no read limit of its own, so the phases are
    /// set on the async builder it wraps. Its 30 second default timeout is
    /// disabled; deadlines come with each request.
    fn session(tls_verify: bool, connect: Option<Duration>, read: Option<Duration>) -> Result<Client, Error> {
        let mut inner = reqwest::Client::builder().danger_accept_invalid_certs(!tls_verify);
        if let Some(connect) = connect {
            inner = inner.connect_timeout(connect);
        }
        if let Some(read) = read {
            inner = inner.read_timeout(read);
        }
        ClientBuilder::from(inner)
            .timeout(None::<Duration>)
            .build()
            .map_err(Error::from_transport)
    }

    fn with_body(builder: RequestBuilder, body: &EncodedBody) -> Result<RequestBuilder, Error> {
        let builder = match body {
            EncodedBody::None => builder,
            EncodedBody::Raw { content_type, data } => match content_type {
                Some(content_type) => builder.header(CONTENT_TYPE, *content_type),
                None => builder,
            }
            .body(data.to_vec()),
            EncodedBody::Json(value) => builder.json(value),
            EncodedBody::Form(fields) => builder.form(fields),
            EncodedBody::Multipart(part) => builder.multipart(Self::file_form(part)?),
        };
        Ok(builder)
    }

    /// The opened file is owned by the form and closed when the request
    /// is dropped, whatever the outcome.
    fn file_form(part: &FilePart) -> Result<Form, Error> {
        let upload_error = |source| Error::Upload {
            path: part.path.clone(),
            source,
        };
        let file = std::fs::File::open(&part.path).map_err(upload_error)?;
        let length = file.metadata().map_err(upload_error)?.len();
        let file_part = Part::reader_with_length(file, length)
            .file_name(part.file_name.clone())
            .mime_str(&part.mime_type)
            .map_err(Error::from_transport)?;
        Ok(Form::new().part(part.field.clone(), file_part))
    }
}

impl BlockingTransport for ReqwestBlocking {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse, Error> {
        let (client, deadline) = self
            .sessions
            .select(&request.timeout, |connect, read| Self::session(self.tls_verify, connect, read))?;
        let mut builder = client
            .request(request.method.into(), request.url.clone())
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(deadline) = deadline {
            builder = builder.timeout(deadline);
        }
        let builder = Self::with_body(builder, &request.body)?;

        let response = builder.send().map_err(Error::from_transport)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(Error::from_transport)?;
        Ok(RawResponse { status, headers, body })
    }
}
