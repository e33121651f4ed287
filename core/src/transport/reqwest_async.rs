use std::sync::Arc;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};
use tokio_util::io::ReaderStream;

use super::{AsyncTransport, Sessions};
use crate::body::{EncodedBody, FilePart};
use crate::config::ClientOptions;
use crate::error::Error;
use crate::http::{PreparedRequest, RawResponse};

/// Async transport over `reqwest::Client` sessions. Cloning shares the
/// sessions.
#[derive(Debug, Clone)]
pub struct ReqwestAsync {
    tls_verify: bool,
    sessions: Arc<Sessions<Client>>,
}

impl ReqwestAsync {
    pub fn new(options: &ClientOptions) -> Result<Self, Error> {
        let client = Self::session(options.tls_verify, None, None)?;
        Ok(Self {
            tls_verify: options.tls_verify,
            sessions: Arc::new(Sessions::new(client)),
        })
    }

    fn session(tls_verify: bool, connect: Option<Duration>, read: Option<Duration>) -> Result<Client, Error> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!tls_verify);
        if let Some(connect) = connect {
            builder = builder.connect_timeout(connect);
        }
        if let Some(read) = read {
            builder = builder.read_timeout(read);
        }
        builder.build().map_err(Error::from_transport)
    }

    async fn with_body(builder: RequestBuilder, body: &EncodedBody) -> Result<RequestBuilder, Error> {
        let builder = match body {
            EncodedBody::None => builder,
            EncodedBody::Raw { content_type, data } => match content_type {
                Some(content_type) => builder.header(CONTENT_TYPE, *content_type),
                None => builder,
            }
            .body(data.clone()),
            EncodedBody::Json(value) => builder.json(value),
            EncodedBody::Form(fields) => builder.form(fields),
            EncodedBody::Multipart(part) => builder.multipart(Self::file_form(part).await?),
        };
        Ok(builder)
    }

    /// Streams the file; the handle lives inside the request body and is
    /// closed when the request is dropped, including on timeout.
    async fn file_form(part: &FilePart) -> Result<Form, Error> {
        let upload_error = |source| Error::Upload {
            path: part.path.clone(),
            source,
        };
        let file = tokio::fs::File::open(&part.path).await.map_err(upload_error)?;
        let length = file.metadata().await.map_err(upload_error)?.len();
        let stream = Body::wrap_stream(ReaderStream::new(file));
        let file_part = Part::stream_with_length(stream, length)
            .file_name(part.file_name.clone())
            .mime_str(&part.mime_type)
            .map_err(Error::from_transport)?;
        Ok(Form::new().part(part.field.clone(), file_part))
    }
}

impl AsyncTransport for ReqwestAsync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, Error> {
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
        let builder = Self::with_body(builder, &request.body).await?;

        let response = builder.send().await.map_err(Error::from_transport)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Error::from_transport)?;
        Ok(RawResponse { status, headers, body })
    }
}
