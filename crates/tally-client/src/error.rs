use thiserror::Error;

use tally_transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Caller misuse: a blank required field or an invalid option value.
    /// Raised before anything touches the network, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A well-formed JSON response that does not match the expected
    /// domain shape.
    #[error("error translating {entity}: {source}")]
    Translate {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub(crate) fn translate(entity: &'static str) -> impl FnOnce(serde_json::Error) -> ClientError {
        move |source| ClientError::Translate { entity, source }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
