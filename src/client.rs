//! `RestClient`: the single entry point callers use.
//!
//! Two modes, selected at runtime:
//! - **Simple** (default, breaker `Off`): every request is attempted exactly once.
//! - **Guarded** ([`RestClient::enable_retry_circuit_breaker`]): requests are retried with
//!   exponential backoff; when retries run out, further requests are rejected for the open
//!   duration, after which a single probe decides whether to resume.
//!
//! HTTP-level failures come back as [`ResponseOutcome::Failure`]; only malformed requests
//! and invalid configuration are errors.

use crate::breaker::{BreakerConfig, BreakerConfigError, CircuitBreaker, CircuitState};
use crate::clock::Clock;
use crate::config::{self, ClientConfig, Timeouts};
use crate::error::RestError;
use crate::query;
use crate::request::RequestDescriptor;
use crate::response::ResponseOutcome;
use crate::sleeper::Sleeper;
use crate::transport::{ReqwestTransport, Transport, TransportRequest};
use crate::Jitter;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;
use url::Url;

/// Resilient HTTP(S) client. Clones share the breaker and the transport.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Arc<Url>,
    transport: Arc<dyn Transport>,
    breaker: CircuitBreaker,
}

impl RestClient {
    /// Build a client over HTTP(S) from `config`.
    ///
    /// # Examples
    /// ```
    /// use restguard::{ClientConfig, RestClient, CircuitState};
    /// let client = RestClient::new(ClientConfig::new("https://example.com/api/")).unwrap();
    /// assert_eq!(client.state(), CircuitState::Off);
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self, RestError> {
        let base_url = config.parse_base_url()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::from_parts(base_url, Arc::new(transport)))
    }

    /// Build a client over a custom transport.
    pub fn with_transport<T>(base_url: &str, transport: T) -> Result<Self, RestError>
    where
        T: Transport + 'static,
    {
        let base_url = config::parse_base_url(base_url)?;
        Ok(Self::from_parts(base_url, Arc::new(transport)))
    }

    fn from_parts(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self { base_url: Arc::new(base_url), transport, breaker: CircuitBreaker::new() }
    }

    /// Override the clock used for the open-state cooldown.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.breaker = self.breaker.with_clock(clock);
        self
    }

    /// Override how retries wait.
    pub fn with_sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.breaker = self.breaker.with_sleeper(sleeper);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.breaker = self.breaker.with_jitter(jitter);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Set read, write and connect timeouts in milliseconds. Applies to requests started
    /// afterwards.
    pub fn set_timeouts(&self, read_ms: u64, write_ms: u64, connect_ms: u64) -> Result<(), RestError> {
        self.transport.set_timeouts(Timeouts::from_millis(read_ms, write_ms, connect_ms))
    }

    /// Turn on retries and the circuit breaker; the state becomes `Closed`.
    pub fn enable_retry_circuit_breaker(
        &self,
        max_attempts: usize,
        max_retry_delay_ms: u64,
        open_duration_ms: u64,
    ) -> Result<(), BreakerConfigError> {
        let config = BreakerConfig::from_millis(max_attempts, max_retry_delay_ms, open_duration_ms)?;
        self.breaker.enable(config);
        Ok(())
    }

    /// Back to single attempts. Errors with [`BreakerConfigError::AlreadyDisabled`] if
    /// already off.
    pub fn disable_retry_circuit_breaker(&self) -> Result<(), BreakerConfigError> {
        self.breaker.disable()
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Active retry/breaker parameters, `None` while off.
    pub fn breaker_config(&self) -> Option<BreakerConfig> {
        self.breaker.config()
    }

    /// Resolve the request path against the base URL and append its query parameters.
    pub fn resolve(&self, request: &RequestDescriptor) -> Result<Url, RestError> {
        let mut url = self.base_url.join(request.path()).map_err(|e| {
            RestError::InvalidRequest(format!("cannot resolve path `{}`: {}", request.path(), e))
        })?;
        if !request.query_params().is_empty() {
            let encoded = query::encode_query(request.query_params().iter().map(|(k, v)| (k, v)));
            let merged = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{}&{}", existing, encoded),
                _ => encoded,
            };
            url.set_query(Some(&merged));
        }
        Ok(url)
    }

    /// Send one logical request according to the current breaker state.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<ResponseOutcome, RestError> {
        request.validate()?;
        let prepared = TransportRequest {
            verb: request.verb(),
            url: self.resolve(request)?,
            headers: request.header_list().to_vec(),
            body: request.body_content().map(str::to_owned),
        };
        let transport = self.transport.as_ref();
        let prepared = &prepared;

        let outcome = self
            .breaker
            .dispatch(|| async move {
                tracing::debug!(verb = %prepared.verb, url = %prepared.url, "sending request");
                ResponseOutcome::from_transport(transport.attempt(prepared).await)
            })
            .await;
        Ok(outcome)
    }

    /// GET `path` and return the body. Any non-success outcome is an error.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String, RestError> {
        let request = RequestDescriptor::get(path).query_pairs(params.iter().copied());
        match self.send(&request).await?.into_result() {
            Ok(response) => Ok(response.into_body()),
            Err(failure) => Err(RestError::Failed(failure)),
        }
    }

    /// POST `body` and return the status code of the last response.
    ///
    /// Errors only when no response was received at all (transport failure, rejection).
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<String>,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<u16, RestError> {
        match self.post_response(path, body, params, headers).await? {
            ResponseOutcome::Success(response) => Ok(response.status()),
            ResponseOutcome::Failure(failure) => match failure.status() {
                Some(status) => Ok(status),
                None => Err(RestError::Failed(failure)),
            },
        }
    }

    /// POST `body` and return the full outcome.
    pub async fn post_response(
        &self,
        path: &str,
        body: impl Into<String>,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<ResponseOutcome, RestError> {
        let request = RequestDescriptor::post(path)
            .query_pairs(params.iter().copied())
            .headers(headers.iter().copied())
            .body(body);
        self.send(&request).await
    }

    /// PUT `body` and return the full outcome.
    pub async fn put(
        &self,
        path: &str,
        body: impl Into<String>,
        params: &[(&str, &str)],
    ) -> Result<ResponseOutcome, RestError> {
        let request = RequestDescriptor::put(path).query_pairs(params.iter().copied()).body(body);
        self.send(&request).await
    }

    /// DELETE `path` and return the full outcome.
    pub async fn delete(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<ResponseOutcome, RestError> {
        let request = RequestDescriptor::delete(path).query_pairs(params.iter().copied());
        self.send(&request).await
    }
}

impl Service<RequestDescriptor> for RestClient {
    type Response = ResponseOutcome;
    type Error = RestError;
    type Future = BoxFuture<'static, Result<ResponseOutcome, RestError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: RequestDescriptor) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.send(&request).await })
    }
}
