//! HTTP client with builder pattern.
//!
//! Thin layer over a [`Coordinator`]: each request gets a fresh
//! [`TransferHandle`], configured through [`HttpRequestBuilder`].
//!
//! # Example
//!
//! ```rust,ignore
//! use multinet::http::HttpClient;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build(coordinator);
//!
//! let resp = client.get("https://example.com")
//!     .header("Accept", "text/html")
//!     .send()?
//!     .await?;
//! ```

use crate::base::error::Error;
use crate::engine::TransferEngine;
use crate::http::builder::HttpRequestBuilder;
use crate::http::proxy::ProxySettings;
use crate::http::request::{AuthMode, Request};
use crate::http::requestbody::RequestBody;
use crate::multi::{Coordinator, ResponseFuture};
use crate::reactor::Reactor;
use crate::transfer::{Progress, TransferHandle};
use bytes::Bytes;
use http::Method;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use zeroize::Zeroizing;

/// HTTP client for making requests.
///
/// Use [`HttpClient::builder()`] to set client-wide defaults.
pub struct HttpClient<E: TransferEngine + 'static, R: Reactor + 'static> {
    coordinator: Coordinator<E, R>,
    defaults: Request,
}

impl<E: TransferEngine + 'static, R: Reactor + 'static> Clone for HttpClient<E, R> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

impl<E: TransferEngine + 'static, R: Reactor + 'static> HttpClient<E, R> {
    /// Wraps `coordinator` with no request defaults.
    pub fn new(coordinator: Coordinator<E, R>) -> Self {
        Self {
            coordinator,
            defaults: Request::default(),
        }
    }

    /// Returns a builder for client-wide defaults.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// The coordinator requests are registered with.
    pub fn coordinator(&self) -> &Coordinator<E, R> {
        &self.coordinator
    }

    /// Starts a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder<E, R> {
        self.request(Method::GET, url)
    }

    /// Starts a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder<E, R> {
        self.request(Method::POST, url)
    }

    /// Starts a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder<E, R> {
        self.request(Method::PUT, url)
    }

    /// Starts a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder<E, R> {
        self.request(Method::DELETE, url)
    }

    /// Starts a HEAD request.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder<E, R> {
        self.request(Method::HEAD, url)
    }

    /// Starts a request with an arbitrary method, prefilled with the client defaults.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder<E, R> {
        let mut request = self.defaults.clone();
        request.method = method.as_str().to_string();
        request.url = url.as_ref().to_string();
        RequestBuilder {
            client: self.clone(),
            request,
            error: None,
        }
    }

    /// Starts a fully described request.
    pub fn fetch(&self, request: &Request) -> Result<ResponseFuture, Error> {
        let mut handle = TransferHandle::new();
        HttpRequestBuilder::configure(&mut handle, request)?;
        self.coordinator.add(handle)
    }

    /// Starts `request` on a handle from an earlier transfer. The handle is
    /// reset first.
    pub fn fetch_with(&self, mut handle: TransferHandle, request: &Request) -> Result<ResponseFuture, Error> {
        handle.reset();
        HttpRequestBuilder::configure(&mut handle, request)?;
        self.coordinator.add(handle)
    }
}

/// Client-wide request defaults.
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    proxy: Option<ProxySettings>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    ca_certs: Option<PathBuf>,
    use_gzip: bool,
}

impl HttpClientBuilder {
    /// Proxy used for every request.
    pub fn proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Overall request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// CA bundle used to verify peers.
    pub fn ca_certs(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_certs = Some(path.into());
        self
    }

    /// Asks for gzip-encoded responses.
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.use_gzip = enabled;
        self
    }

    /// Creates the client on top of `coordinator`.
    pub fn build<E, R>(self, coordinator: Coordinator<E, R>) -> HttpClient<E, R>
    where
        E: TransferEngine + 'static,
        R: Reactor + 'static,
    {
        let defaults = Request {
            proxy: self.proxy,
            request_timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent,
            ca_certs: self.ca_certs,
            use_gzip: self.use_gzip,
            ..Request::default()
        };
        HttpClient {
            coordinator,
            defaults,
        }
    }
}

/// Builder for a single request.
pub struct RequestBuilder<E: TransferEngine + 'static, R: Reactor + 'static> {
    client: HttpClient<E, R>,
    request: Request,
    error: Option<Error>,
}

impl<E: TransferEngine + 'static, R: Reactor + 'static> RequestBuilder<E, R> {
    /// Sets a header. An invalid name or value fails the request at
    /// [`RequestBuilder::send`].
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Err(err) = self.request.headers.insert(name, value) {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Sets the request body.
    pub fn body<B: Into<RequestBody>>(mut self, body: B) -> Self {
        self.request.body = body.into();
        self
    }

    /// Serializes `json` as the body and sets `Content-Type`.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.request.body = bytes.into();
                self.header("Content-Type", "application/json")
            }
            Err(err) => {
                self.error.get_or_insert(err.into());
                self
            }
        }
    }

    /// Sets credentials and selects basic authentication.
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.request.username = Some(username.to_string());
        self.request.password = Some(Zeroizing::new(password.to_string()));
        self.request.auth_mode = Some(AuthMode::Basic);
        self
    }

    /// Authentication scheme for the credentials.
    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.request.auth_mode = Some(mode);
        self
    }

    /// Overall request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.request_timeout = Some(timeout);
        self
    }

    /// Connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.request.connect_timeout = Some(timeout);
        self
    }

    /// Whether to follow redirects.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.request.follow_redirects = follow;
        self
    }

    /// Maximum number of redirects followed.
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.request.max_redirects = Some(max);
        self
    }

    /// Proxy for this request only.
    pub fn proxy(mut self, proxy: ProxySettings) -> Self {
        self.request.proxy = Some(proxy);
        self
    }

    /// CA bundle used to verify the peer.
    pub fn ca_certs(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.ca_certs = Some(path.into());
        self
    }

    /// Client certificate and private key (PEM paths).
    pub fn client_identity(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.request.client_cert = Some(cert.into());
        self.request.client_key = Some(key.into());
        self
    }

    /// Sends body pieces to `sink` instead of collecting them in the response.
    pub fn stream_body(mut self, sink: UnboundedSender<Bytes>) -> Self {
        self.request.body_sink = Some(sink);
        self
    }

    /// Sends raw header lines to `sink`.
    pub fn stream_headers(mut self, sink: UnboundedSender<Bytes>) -> Self {
        self.request.header_sink = Some(sink);
        self
    }

    /// Sends transfer progress to `sink`.
    pub fn progress(mut self, sink: UnboundedSender<Progress>) -> Self {
        self.request.progress_sink = Some(sink);
        self
    }

    /// The assembled request description.
    pub fn build(self) -> Result<Request, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.request),
        }
    }

    /// Registers the request with the coordinator.
    pub fn send(self) -> Result<ResponseFuture, Error> {
        let client = self.client.clone();
        let request = self.build()?;
        client.fetch(&request)
    }
}
