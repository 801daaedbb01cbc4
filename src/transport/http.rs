//! HTTP(S) transport on top of `reqwest`.

use super::{Transport, TransportError, TransportErrorKind, TransportRequest, TransportResponse};
use crate::config::{BasicAuth, ClientConfig, Timeouts};
use crate::error::RestError;
use crate::request::Verb;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Certificate, Client, Proxy};
use std::error::Error as _;
use std::io::ErrorKind;
use std::sync::Arc;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Settings fixed at construction; only timeouts change afterwards.
#[derive(Debug, Clone)]
struct Settings {
    credentials: Option<BasicAuth>,
    trust_store_pem: Option<Vec<u8>>,
    proxy_url: Option<String>,
    follow_redirects: bool,
    hostname_overrides: Vec<String>,
    user_agent: String,
}

#[derive(Debug)]
struct Clients {
    strict: Client,
    /// Skips hostname verification; only used for `hostname_overrides`.
    relaxed: Option<Client>,
}

/// Transport backed by a pooled `reqwest::Client`.
#[derive(Debug)]
pub struct ReqwestTransport {
    settings: Settings,
    clients: ArcSwap<Clients>,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, RestError> {
        let settings = Settings {
            credentials: config.credentials.clone(),
            trust_store_pem: config.trust_store_pem.clone(),
            proxy_url: config.effective_proxy().map(|p| p.url()),
            follow_redirects: config.follow_redirects,
            hostname_overrides: config.hostname_overrides.clone(),
            user_agent: config.user_agent.clone(),
        };
        let clients = build_clients(&settings, config.timeouts).map_err(RestError::ClientBuild)?;
        Ok(Self { settings, clients: ArcSwap::from_pointee(clients) })
    }

    fn client_for(&self, request: &TransportRequest) -> Client {
        let clients = self.clients.load();
        let overridden = request
            .url
            .host_str()
            .is_some_and(|host| self.settings.hostname_overrides.iter().any(|h| h == host));
        match (&clients.relaxed, overridden) {
            (Some(relaxed), true) => relaxed.clone(),
            _ => clients.strict.clone(),
        }
    }
}

fn build_client(settings: &Settings, timeouts: Timeouts, relaxed: bool) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(timeouts.connect())
        .read_timeout(timeouts.read())
        .timeout(timeouts.exchange())
        .redirect(if settings.follow_redirects { Policy::default() } else { Policy::none() });

    if let Some(pem) = &settings.trust_store_pem {
        builder = builder.add_root_certificate(Certificate::from_pem(pem)?);
    }
    if let Some(proxy) = &settings.proxy_url {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }
    if relaxed {
        builder = builder.danger_accept_invalid_hostnames(true);
    }
    builder.build()
}

fn build_clients(settings: &Settings, timeouts: Timeouts) -> reqwest::Result<Clients> {
    let strict = build_client(settings, timeouts, false)?;
    let relaxed = if settings.hostname_overrides.is_empty() {
        None
    } else {
        Some(build_client(settings, timeouts, true)?)
    };
    Ok(Clients { strict, relaxed })
}

/// First `std::io::Error` in the source chain, if any.
fn io_cause(err: &reqwest::Error) -> Option<&std::io::Error> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = cause.source();
    }
    None
}

/// A connection lost mid-body is an I/O failure; only malformed data is a protocol error.
fn map_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else if err.is_builder() {
        TransportErrorKind::InvalidRequest
    } else if err.is_redirect() {
        TransportErrorKind::Protocol
    } else {
        match io_cause(&err).map(std::io::Error::kind) {
            Some(ErrorKind::TimedOut) => TransportErrorKind::Timeout,
            Some(ErrorKind::InvalidData) => TransportErrorKind::Protocol,
            Some(_) => TransportErrorKind::Io,
            None if err.is_decode() => TransportErrorKind::Protocol,
            None => TransportErrorKind::Io,
        }
    };
    TransportError::new(kind, err.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn attempt(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = self.client_for(request);
        let mut builder = match request.verb {
            Verb::Get => client.get(request.url.clone()),
            Verb::Delete => client.delete(request.url.clone()),
            Verb::Post => client.post(request.url.clone()),
            Verb::Put => client.put(request.url.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = &self.settings.credentials {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }
        if request.verb.carries_body() {
            builder = builder
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(request.body.clone().unwrap_or_default());
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        tracing::debug!(verb = %request.verb, url = %request.url, status, "transport attempt completed");

        if status == 307 {
            let location =
                response.headers().get(LOCATION).and_then(|v| v.to_str().ok()).map(str::to_owned);
            return Ok(TransportResponse { status, body: String::new(), location });
        }
        let body = response.text().await.map_err(map_error)?;
        Ok(TransportResponse { status, body, location: None })
    }

    fn set_timeouts(&self, timeouts: Timeouts) -> Result<(), RestError> {
        let clients = build_clients(&self.settings, timeouts).map_err(RestError::ClientBuild)?;
        self.clients.store(Arc::new(clients));
        tracing::debug!(
            read_ms = timeouts.read_ms,
            write_ms = timeouts.write_ms,
            connect_ms = timeouts.connect_ms,
            "transport timeouts updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let transport = ReqwestTransport::new(&ClientConfig::new("http://localhost:1/"));
        assert!(transport.is_ok());
    }

    #[test]
    fn relaxed_client_only_when_overrides_present() {
        let plain = ReqwestTransport::new(&ClientConfig::new("https://example.com")).unwrap();
        assert!(plain.clients.load().relaxed.is_none());

        let overridden = ReqwestTransport::new(
            &ClientConfig::new("https://example.com").with_hostname_override("services.example.com"),
        )
        .unwrap();
        assert!(overridden.clients.load().relaxed.is_some());
    }

    #[test]
    fn proxy_is_applied_when_complete() {
        let config = ClientConfig::new("http://example.com").with_proxy("proxy.local", 3128);
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.settings.proxy_url.as_deref(), Some("http://proxy.local:3128"));

        let ignored = ReqwestTransport::new(&ClientConfig::new("http://example.com").with_proxy("", 0))
            .unwrap();
        assert!(ignored.settings.proxy_url.is_none());
    }

    #[test]
    fn unbuildable_request_maps_to_invalid_request() {
        let err = Client::new().get("no scheme here").build().unwrap_err();
        let mapped = map_error(err);
        assert_eq!(mapped.kind(), TransportErrorKind::InvalidRequest);
    }

    #[test]
    fn timeouts_can_be_swapped() {
        let transport = ReqwestTransport::new(&ClientConfig::new("http://localhost:1/")).unwrap();
        assert!(transport.set_timeouts(Timeouts::from_millis(10, 10, 10)).is_ok());
    }
}
