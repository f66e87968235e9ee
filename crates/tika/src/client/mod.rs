//! HTTP client for a running Tika Server.
//!
//! Every operation is a single request/response exchange built on
//! [`Client::call`]; they differ only in method, path, headers and body.
//! A `Client` holds no mutable state and can be cloned freely and used from
//! many tasks at once.
//!
//! # Example
//!
//! ```no_run
//! use tika::Client;
//!
//! #[tokio::main]
//! async fn main() -> tika::Result<()> {
//!     let client = Client::new("http://localhost:9998");
//!     let file = tokio::fs::File::open("report.pdf").await?;
//!     let text = client.parse(file).await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

mod options;

pub use options::{RecursiveContentType, Translator};

use crate::capabilities::{Detector, MimeTypeRegistry, Parser, from_json_object};
use crate::error::{ClientError, Result, TikaError};
use crate::metadata::{RecursiveMetadata, content_of, normalize_recursive_metadata};
use bytes::Bytes;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Body, Method, Url};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A connection to a Tika Server.
#[derive(Debug, Clone)]
pub struct Client {
    /// Server URL including the port, without a trailing slash.
    base_url: String,
    http: reqwest::Client,
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

impl Client {
    /// Create a client for the server at `base_url`, e.g. `http://localhost:9998`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Create a client that sends requests through `http`.
    ///
    /// Use this to configure timeouts, proxies or TLS on the underlying
    /// `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request to `base_url + path` and return the response body.
    ///
    /// # Errors
    ///
    /// - `TikaError::Request` if the URL is empty or invalid, or `method` is not a valid HTTP method
    /// - `TikaError::Transport` if the request could not be delivered
    /// - `TikaError::Client` if the status is outside `200..=299`; the body is attached
    pub async fn call(
        &self,
        body: Option<Body>,
        method: &str,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<Bytes> {
        let response = self.send(body, method, path, headers).await?;
        Ok(response.bytes().await?)
    }

    /// Like [`call`](Self::call), but returns the body as a string.
    pub async fn call_string(
        &self,
        body: Option<Body>,
        method: &str,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<String> {
        let response = self.send(body, method, path, headers).await?;
        Ok(response.text().await?)
    }

    /// Like [`call`](Self::call), but leaves the body unread for streaming.
    pub async fn call_stream(
        &self,
        body: Option<Body>,
        method: &str,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<ContentStream> {
        let response = self.send(body, method, path, headers).await?;
        Ok(ContentStream { response })
    }

    async fn send(
        &self,
        body: Option<Body>,
        method: &str,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response> {
        if self.base_url.is_empty() {
            return Err(TikaError::request("no server URL configured"));
        }
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| TikaError::request_with_source(format!("invalid HTTP method {:?}", method), e))?;
        let raw_url = format!("{}{}", self.base_url, path);
        let url = Url::parse(&raw_url)
            .map_err(|e| TikaError::request_with_source(format!("invalid URL {:?}", raw_url), e))?;

        tracing::debug!(%method, %url, "Sending Tika request");

        let mut request = self.http.request(method, url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            // The server usually explains the failure in the body.
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(status = status.as_u16(), "Failed to read error response body: {}", e);
                    String::new()
                }
            };
            tracing::debug!(status = status.as_u16(), "Tika request failed");
            return Err(ClientError::new(status.as_u16(), body).into());
        }

        Ok(response)
    }

    /// Parse `input` and return its plain text content.
    pub async fn parse(&self, input: impl Into<Body>) -> Result<String> {
        self.call_string(Some(input.into()), "PUT", "/tika", None).await
    }

    /// Parse `input`, streaming the response instead of buffering it.
    pub async fn parse_stream(&self, input: impl Into<Body>) -> Result<ContentStream> {
        self.call_stream(Some(input.into()), "PUT", "/tika", None).await
    }

    /// Parse `input` and all embedded documents, returning one content string
    /// per document that has content, in document order.
    ///
    /// See [`meta_recursive`](Self::meta_recursive) for the other fields.
    pub async fn parse_recursive(&self, input: impl Into<Body>) -> Result<Vec<String>> {
        let documents = self.meta_recursive(input).await?;
        Ok(content_of(&documents))
    }

    /// Metadata of `input` as returned by the server.
    pub async fn meta(&self, input: impl Into<Body>) -> Result<String> {
        self.call_string(Some(input.into()), "PUT", "/meta", None).await
    }

    /// A single metadata `field` of `input`.
    pub async fn meta_field(&self, input: impl Into<Body>, field: &str) -> Result<String> {
        self.call_string(Some(input.into()), "PUT", &format!("/meta/{}", field), None)
            .await
    }

    /// Metadata of `input` and all embedded documents, with content as plain text.
    pub async fn meta_recursive(&self, input: impl Into<Body>) -> Result<RecursiveMetadata> {
        self.meta_recursive_type(input, RecursiveContentType::Text).await
    }

    /// Metadata of `input` and all embedded documents, with content in the given form.
    pub async fn meta_recursive_type(
        &self,
        input: impl Into<Body>,
        content_type: RecursiveContentType,
    ) -> Result<RecursiveMetadata> {
        let body = self
            .call(Some(input.into()), "PUT", content_type.path(), None)
            .await?;
        normalize_recursive_metadata(&body)
    }

    /// MIME type of `input`.
    pub async fn detect(&self, input: impl Into<Body>) -> Result<String> {
        self.call_string(Some(input.into()), "PUT", "/detect/stream", None)
            .await
    }

    /// Two letter language code of `input`.
    pub async fn language(&self, input: impl Into<Body>) -> Result<String> {
        self.call_string(Some(input.into()), "PUT", "/language/stream", None)
            .await
    }

    /// Two letter language code of `text`.
    pub async fn language_string(&self, text: impl Into<String>) -> Result<String> {
        self.call_string(Some(Body::from(text.into())), "PUT", "/language/string", None)
            .await
    }

    /// Translate `input` from `src` to `dst` language using `translator`.
    pub async fn translate(
        &self,
        input: impl Into<Body>,
        translator: &Translator,
        src: &str,
        dst: &str,
    ) -> Result<String> {
        self.call_string(Some(input.into()), "POST", &translate_path(translator, src, dst), None)
            .await
    }

    /// Streaming variant of [`translate`](Self::translate).
    pub async fn translate_stream(
        &self,
        input: impl Into<Body>,
        translator: &Translator,
        src: &str,
        dst: &str,
    ) -> Result<ContentStream> {
        self.call_stream(Some(input.into()), "POST", &translate_path(translator, src, dst), None)
            .await
    }

    /// Server version string; doubles as the readiness check.
    pub async fn version(&self) -> Result<String> {
        self.call_string(None, "GET", "/version", None).await
    }

    /// Root of the parser tree.
    pub async fn parsers(&self) -> Result<Parser> {
        let body = self
            .call(None, "GET", "/parsers/details", Some(json_headers()))
            .await?;
        from_json_object(&body)
    }

    /// Root of the detector tree.
    pub async fn detectors(&self) -> Result<Detector> {
        let body = self.call(None, "GET", "/detectors", Some(json_headers())).await?;
        from_json_object(&body)
    }

    /// All MIME types known to the server.
    pub async fn mime_types(&self) -> Result<MimeTypeRegistry> {
        let body = self.call(None, "GET", "/mime-types", Some(json_headers())).await?;
        from_json_object(&body)
    }
}

fn translate_path(translator: &Translator, src: &str, dst: &str) -> String {
    format!("/translate/all/{}/{}/{}", translator.class_name(), src, dst)
}

/// Response body of a successful request, read incrementally.
#[derive(Debug)]
pub struct ContentStream {
    response: reqwest::Response,
}

impl ContentStream {
    /// Next chunk of the body, or `None` once it is exhausted.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.response.chunk().await?)
    }

    /// Read the remaining body as a string.
    pub async fn text(self) -> Result<String> {
        Ok(self.response.text().await?)
    }

    /// Copy the remaining body into `writer`, returning the number of bytes written.
    pub async fn copy_to<W>(&mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}
