//! Declarative request description.

use crate::http::orderedheaders::OrderedHeaders;
use crate::http::proxy::ProxySettings;
use crate::http::requestbody::RequestBody;
use crate::transfer::Progress;
use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use zeroize::Zeroizing;

/// Server authentication scheme. Values are the engine's auth bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Basic,
    Digest,
    Negotiate,
    Ntlm,
    /// Let the engine pick the most secure scheme the server offers.
    Any,
}

impl AuthMode {
    /// Engine bit mask for this scheme.
    pub fn bits(&self) -> i64 {
        match self {
            AuthMode::Basic => 1,
            AuthMode::Digest => 1 << 1,
            AuthMode::Negotiate => 1 << 2,
            AuthMode::Ntlm => 1 << 3,
            AuthMode::Any => 1 | (1 << 1) | (1 << 2) | (1 << 3),
        }
    }
}

/// Everything needed to configure one HTTP transfer.
///
/// Fields are public; unset optional fields leave the engine default in
/// place. Redirect limit defaults to 20, matching common browser behavior.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    /// Empty means GET.
    pub method: String,
    pub headers: OrderedHeaders,
    pub body: RequestBody,

    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub auth_mode: Option<AuthMode>,

    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub follow_redirects: bool,
    pub max_redirects: Option<u32>,

    pub user_agent: Option<String>,
    pub use_gzip: bool,
    pub network_interface: Option<String>,
    pub proxy: Option<ProxySettings>,
    /// Send methods other than GET/PUT/POST/DELETE/HEAD verbatim.
    pub allow_nonstandard_methods: bool,

    pub validate_cert: bool,
    pub ca_certs: Option<PathBuf>,
    pub allow_ipv6: bool,
    pub client_key: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,

    /// Receives body chunks as they arrive instead of the response body.
    pub body_sink: Option<UnboundedSender<Bytes>>,
    /// Receives raw header lines as they arrive.
    pub header_sink: Option<UnboundedSender<Bytes>>,
    pub progress_sink: Option<UnboundedSender<Progress>>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: String::new(),
            headers: OrderedHeaders::new(),
            body: RequestBody::Empty,
            username: None,
            password: None,
            auth_mode: None,
            connect_timeout: None,
            request_timeout: None,
            follow_redirects: true,
            max_redirects: Some(20),
            user_agent: None,
            use_gzip: false,
            network_interface: None,
            proxy: None,
            allow_nonstandard_methods: false,
            validate_cert: true,
            ca_certs: None,
            allow_ipv6: true,
            client_key: None,
            client_cert: None,
            body_sink: None,
            header_sink: None,
            progress_sink: None,
        }
    }
}

impl Request {
    /// A request with defaults for everything but method and URL.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    /// A GET request for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Method name normalized for dispatch; empty maps to GET.
    pub(crate) fn effective_method(&self) -> String {
        if self.method.is_empty() {
            "GET".to_string()
        } else {
            self.method.to_ascii_uppercase()
        }
    }
}
