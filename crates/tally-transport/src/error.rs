use std::fmt;

use thiserror::Error;

/// A non-2xx response codified by the Tally API: an error code, a
/// message, and an optional detail field with additional context.
#[derive(Clone, Debug)]
pub struct ApiError {
    pub status: u16,
    pub seq_code: Option<String>,
    pub message: String,
    pub detail: Option<String>,
    /// Server-declared retry flag for this failure.
    pub retriable: bool,
    pub request_id: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.seq_code.as_deref().filter(|c| !c.is_empty()) {
            write!(f, "Code: {code} ")?;
        }
        write!(f, "Message: {}", self.message)?;
        if let Some(detail) = self.detail.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " Detail: {detail}")?;
        }
        write!(
            f,
            " Request-ID: {}",
            self.request_id.as_deref().unwrap_or("-")
        )
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure: reset, timeout, unreachable host, or a
    /// response body that could not be read.
    #[error("network error: {message}")]
    Network { message: String },

    /// An HTTP response arrived without the API's correlation header.
    /// The request stopped at some intermediary (a proxy or load
    /// balancer), so it is retried like any other network failure.
    #[error(
        "response HTTP header field {} is unset; there may be network issues \
         between the client and the API (status {status})",
        tally_protocol::headers::REQUEST_ID
    )]
    MissingRequestId { status: u16 },

    /// A JSON body was expected but did not parse. Carries the raw body
    /// for diagnosis; not retried.
    #[error("error decoding JSON response (attempt {attempt_id})")]
    Decode { attempt_id: String, body: String },

    #[error("{0}")]
    Api(ApiError),

    /// Status 401, distinguished from other API errors for convenience.
    #[error("{0}")]
    Unauthorized(ApiError),

    /// Transport misconfiguration (bad proxy address, unparseable CA
    /// certificate). Raised at construction, never sent on the wire.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TransportError {
    /// Whether the retry loop may attempt this request again. Network
    /// failures always qualify; API errors only when the server flagged
    /// them retriable.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::MissingRequestId { .. } => true,
            Self::Api(e) | Self::Unauthorized(e) => e.retriable,
            Self::Decode { .. } | Self::Config(_) => false,
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
