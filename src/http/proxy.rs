use url::Url;
use zeroize::Zeroizing;

/// Proxy protocol, derived from the proxy URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyType {
    /// HTTP proxy (CONNECT for HTTPS)
    Http,
    /// HTTPS proxy (TLS to proxy)
    Https,
    /// SOCKS4 proxy
    Socks4,
    /// SOCKS5 proxy
    Socks5,
}

/// Proxy configuration for a request.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Proxy URL (e.g., `http://proxy.com:8080`)
    pub url: Url,
    /// Proxy username for authentication
    pub username: Option<String>,
    /// Zeroized on drop
    pub password: Option<Zeroizing<String>>,
    /// Comma-separated hosts that bypass the proxy, in `NO_PROXY` syntax.
    pub no_proxy: Option<String>,
}

impl ProxySettings {
    /// Create proxy settings from URL string.
    pub fn new(url_str: &str) -> Option<Self> {
        let url = Url::parse(url_str).ok()?;
        Some(Self {
            url,
            username: None,
            password: None,
            no_proxy: None,
        })
    }

    /// Reads `HTTPS_PROXY`/`https_proxy`, then `HTTP_PROXY`/`http_proxy`,
    /// with bypass rules from `NO_PROXY`/`no_proxy`.
    pub fn from_env() -> Option<Self> {
        let url_str = std::env::var("HTTPS_PROXY")
            .or_else(|_| std::env::var("https_proxy"))
            .or_else(|_| std::env::var("HTTP_PROXY"))
            .or_else(|_| std::env::var("http_proxy"))
            .ok()?;

        let mut settings = Self::new(&url_str)?;
        settings.no_proxy = std::env::var("NO_PROXY")
            .or_else(|_| std::env::var("no_proxy"))
            .ok()
            .filter(|s| !s.is_empty());
        Some(settings)
    }

    /// Add authentication credentials.
    pub fn with_auth(mut self, user: &str, pass: &str) -> Self {
        self.username = Some(user.to_string());
        self.password = Some(Zeroizing::new(pass.to_string()));
        self
    }

    /// Add bypass rules in `NO_PROXY` syntax.
    pub fn with_bypass(mut self, no_proxy: &str) -> Self {
        self.no_proxy = Some(no_proxy.to_string());
        self
    }

    /// Get proxy type from URL scheme.
    pub fn proxy_type(&self) -> ProxyType {
        match self.url.scheme() {
            "https" => ProxyType::Https,
            "socks5" | "socks5h" => ProxyType::Socks5,
            "socks4" | "socks4a" => ProxyType::Socks4,
            _ => ProxyType::Http,
        }
    }

    /// Whether both username and password are set.
    pub fn requires_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Proxy host and port. The port defaults by proxy type when the URL has none.
    pub fn host_port(&self) -> Option<(&str, u16)> {
        let host = self.url.host_str()?;
        let port = self.url.port().unwrap_or(match self.proxy_type() {
            ProxyType::Http => 80,
            ProxyType::Https => 443,
            ProxyType::Socks4 | ProxyType::Socks5 => 1080,
        });
        Some((host, port))
    }

    /// Proxy string in the engine's `scheme://host` form; the port goes
    /// into its own option.
    pub(crate) fn engine_proxy(&self) -> Option<(String, u16)> {
        let (host, port) = self.host_port()?;
        Some((format!("{}://{}", self.url.scheme(), host), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_types() {
        let http = ProxySettings::new("http://proxy.local:3128").unwrap();
        assert_eq!(http.proxy_type(), ProxyType::Http);
        assert_eq!(http.host_port(), Some(("proxy.local", 3128)));

        let socks = ProxySettings::new("socks5h://10.0.0.1").unwrap();
        assert_eq!(socks.proxy_type(), ProxyType::Socks5);
        assert_eq!(socks.host_port(), Some(("10.0.0.1", 1080)));
    }

    #[test]
    fn test_engine_proxy_string() {
        let proxy = ProxySettings::new("https://proxy.local").unwrap();
        assert_eq!(
            proxy.engine_proxy(),
            Some(("https://proxy.local".to_string(), 443))
        );
    }

    #[test]
    fn test_auth() {
        let proxy = ProxySettings::new("http://p:8080")
            .unwrap()
            .with_auth("user", "secret");
        assert!(proxy.requires_auth());
        assert_eq!(proxy.password.as_deref().map(|p| p.as_str()), Some("secret"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(ProxySettings::new("not a url").is_none());
    }
}
