#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # restguard
//!
//! A resilient HTTP(S) REST client: single attempts by default, and on demand a retry
//! circuit breaker that retries transient failures with exponential backoff, stops calling a
//! failing server for a cooldown period, then probes it once before resuming.
//!
//! ## Features
//!
//! - **GET/POST/PUT/DELETE** against a base URL with query encoding, basic auth, custom
//!   trust store, proxy and per-host hostname-verification overrides
//! - **Retry** with a 100 ms floor that doubles up to a configurable ceiling
//! - **Circuit breaker** (`Off` → `Closed` → `Open` → probe) switchable at runtime
//! - **Outcomes as data**: failures are classified (`Permanent`, `Transient`,
//!   `RetriesExhausted`, `CircuitOpen`) instead of thrown
//! - **Injectable clock and sleeper** for deterministic tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restguard::{ClientConfig, RestClient, RestError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RestError> {
//!     let client = RestClient::new(ClientConfig::new("https://api.example.com/v1/"))?;
//!     client.enable_retry_circuit_breaker(3, 1_000, 3_000)?;
//!
//!     let body = client.get("items", &[("page", "1")]).await?;
//!     println!("{body}");
//!
//!     let outcome = client.post_response("items", r#"{"name":"widget"}"#, &[], &[]).await?;
//!     if let Some(failure) = outcome.failure() {
//!         eprintln!("create failed: {failure}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod breaker;
pub mod classify;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod jitter;
pub mod query;
pub mod request;
pub mod response;
pub mod retry;
pub mod sleeper;
pub mod transport;

// Re-exports
pub use backoff::{Backoff, MAX_BACKOFF};
pub use breaker::{
    BreakerConfig, BreakerConfigError, CircuitBreaker, CircuitState, MAX_OPEN_DURATION,
};
pub use classify::{FailureClass, PERMANENT_STATUS_CODES};
pub use client::RestClient;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{BasicAuth, ClientConfig, ProxyConfig, Timeouts, DEFAULT_TIMEOUT_MS};
pub use error::RestError;
pub use jitter::Jitter;
pub use request::{RequestDescriptor, Verb};
pub use response::{Failure, FailureKind, ResponseOutcome, RestResponse};
pub use retry::{BuildError, Retrier, RetrierBuilder};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportErrorKind, TransportRequest,
    TransportResponse,
};
