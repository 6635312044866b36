use std::time::Duration;

use tally_transport::{ProxyConfig, TransportConfig, RETRY_TIMEOUT};

use crate::error::{ClientError, ClientResult};

/// Default API host; the hello endpoint may redirect the session
/// elsewhere.
pub const DEFAULT_ADDR: &str = "api.tally.dev";

/// Settings for one [`Client`](crate::Client).
///
/// `ledger_name` and `credential` are required; everything else has a
/// working default. Unknown options are unrepresentable by construction.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Name of the ledger to address.
    pub ledger_name: String,
    /// API credential secret.
    pub credential: String,
    /// Override the initial API host, `host[:port]` with an optional
    /// scheme. Self-hosted and development deployments only.
    pub addr: Option<String>,
    pub connect_timeout: Option<Duration>,
    /// Per-attempt read timeout for one-shot requests. Feed transports
    /// never apply it: stream-items long-polls server-side.
    pub read_timeout: Option<Duration>,
    /// Wall-clock retry budget per logical request.
    pub retry_timeout: Duration,
    pub proxy: Option<ProxyConfig>,
    /// Extra root certificate (PEM) to trust.
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Disable certificate verification. Development ledgers only.
    pub accept_invalid_certs: bool,
    /// Optional basic auth in front of the API.
    pub basic_auth: Option<(String, String)>,
}

impl ClientConfig {
    pub fn new(ledger_name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            ledger_name: ledger_name.into(),
            credential: credential.into(),
            addr: None,
            connect_timeout: None,
            read_timeout: None,
            retry_timeout: RETRY_TIMEOUT,
            proxy: None,
            ca_cert_pem: None,
            accept_invalid_certs: false,
            basic_auth: None,
        }
    }

    pub(crate) fn validate(&self) -> ClientResult<()> {
        if self.ledger_name.is_empty() {
            return Err(ClientError::Config("ledger_name cannot be blank".into()));
        }
        if self.credential.is_empty() {
            return Err(ClientError::Config("credential cannot be blank".into()));
        }
        Ok(())
    }

    pub(crate) fn initial_addr(&self) -> &str {
        self.addr.as_deref().unwrap_or(DEFAULT_ADDR)
    }

    /// Transport settings for a connection to `addr`. `long_poll` drops
    /// the read timeout for feed connections.
    pub(crate) fn transport_config(&self, addr: &str, long_poll: bool) -> TransportConfig {
        let mut config = TransportConfig::new(addr, self.credential.clone());
        config.connect_timeout = self.connect_timeout;
        config.read_timeout = if long_poll { None } else { self.read_timeout };
        config.retry_timeout = self.retry_timeout;
        config.proxy = self.proxy.clone();
        config.ca_cert_pem = self.ca_cert_pem.clone();
        config.accept_invalid_certs = self.accept_invalid_certs;
        config.basic_auth = self.basic_auth.clone();
        config
    }
}
