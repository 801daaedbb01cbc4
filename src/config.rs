//! Client configuration.
//!
//! One struct with named fields and defaults, validated once when the client is built.
//! With the `serde` feature the types deserialize from any serde format; every field except
//! `base_url` may be omitted.

use crate::error::RestError;
use std::fmt;
use std::time::Duration;
use url::Url;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Default read, write and connect timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Connection timeouts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(default))]
pub struct Timeouts {
    pub read_ms: u64,
    pub write_ms: u64,
    pub connect_ms: u64,
}

impl Timeouts {
    pub fn from_millis(read_ms: u64, write_ms: u64, connect_ms: u64) -> Self {
        Self { read_ms, write_ms, connect_ms }
    }

    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    /// Upper bound for sending a request and reading its response.
    pub fn exchange(&self) -> Duration {
        Duration::from_millis(self.read_ms.saturating_add(self.write_ms))
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from_millis(DEFAULT_TIMEOUT_MS, DEFAULT_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)
    }
}

/// Basic-auth credentials attached to every request.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Plain HTTP proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

impl ProxyConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Everything needed to build a [`RestClient`](crate::RestClient).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct ClientConfig {
    /// Server URL request paths are resolved against.
    pub base_url: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub credentials: Option<BasicAuth>,
    /// Extra PEM-encoded root certificate to trust.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trust_store_pem: Option<Vec<u8>>,
    /// An empty host or a zero port means no proxy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub proxy: Option<ProxyConfig>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timeouts: Timeouts,
    #[cfg_attr(feature = "serde", serde(default))]
    pub follow_redirects: bool,
    /// Peer hosts whose certificate is accepted even if issued for another hostname.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hostname_overrides: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default = "default_user_agent"))]
    pub user_agent: String,
}

impl Default for ClientConfig {
    /// No server URL; set `base_url` before building a client.
    fn default() -> Self {
        Self::new(String::new())
    }
}

fn default_user_agent() -> String {
    format!("restguard/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Defaults for everything but the server URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: None,
            trust_store_pem: None,
            proxy: None,
            timeouts: Timeouts::default(),
            follow_redirects: false,
            hostname_overrides: Vec::new(),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(BasicAuth::new(username, password));
        self
    }

    pub fn with_proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.proxy = Some(ProxyConfig::new(host, port));
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_trust_store_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.trust_store_pem = Some(pem.into());
        self
    }

    pub fn with_hostname_override(mut self, host: impl Into<String>) -> Self {
        self.hostname_overrides.push(host.into());
        self
    }

    /// The proxy to use, skipping incomplete entries.
    pub fn effective_proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref().filter(|p| !p.host.is_empty() && p.port != 0)
    }

    /// Parse and check the base URL.
    pub fn parse_base_url(&self) -> Result<Url, RestError> {
        parse_base_url(&self.base_url)
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, RestError> {
    let invalid = |reason: String| RestError::InvalidBaseUrl { url: raw.to_string(), reason };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme `{}`", other))),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be a base".to_string()));
    }
    Ok(url)
}
