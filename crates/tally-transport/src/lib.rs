//! Resilient HTTP transport for the Tally ledger API.
//!
//! One [`HttpTransport`] owns one logical connection to the API host and
//! executes JSON POSTs with automatic retry: exponential backoff with
//! jitter, an idempotency key held stable across every attempt of a
//! logical call, and classification of failures into retriable and fatal
//! kinds. Session routing and resource semantics live in `tally-client`;
//! this crate knows nothing beyond "POST this body at this path".

pub mod backoff;
pub mod error;
pub mod http;

pub use backoff::{backoff_delay, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS, RETRY_TIMEOUT};
pub use error::{ApiError, TransportError, TransportResult};
pub use http::{FullResponse, HttpTransport, ProxyConfig, TransportConfig};
