use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use tally_protocol::endpoint::headers;
use tally_protocol::envelope::ErrorBody;

use crate::backoff::{backoff_delay, RETRY_TIMEOUT};
use crate::error::{ApiError, TransportError, TransportResult};

const USER_AGENT: &str = concat!("tally-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Outbound proxy settings.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Proxy address, e.g. `http://proxy.internal:3128`.
    pub addr: String,
    pub user: Option<String>,
    pub pass: Option<String>,
}

/// Connection settings for one [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// API host, `host[:port]` with an optional scheme (HTTPS when none
    /// is given).
    pub base_url: String,
    /// API credential secret, sent with every attempt.
    pub credential: String,
    pub connect_timeout: Option<Duration>,
    /// Read timeout per attempt. Leave unset for feed transports: the
    /// stream-items endpoint long-polls server-side.
    pub read_timeout: Option<Duration>,
    /// Wall-clock budget for all attempts of one logical call.
    pub retry_timeout: Duration,
    pub proxy: Option<ProxyConfig>,
    /// Extra root certificate (PEM) to trust in addition to the system
    /// roots.
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Disable certificate verification. Development ledgers only.
    pub accept_invalid_certs: bool,
    /// Optional basic-auth in front of the API (user, password).
    pub basic_auth: Option<(String, String)>,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: credential.into(),
            connect_timeout: None,
            read_timeout: None,
            retry_timeout: RETRY_TIMEOUT,
            proxy: None,
            ca_cert_pem: None,
            accept_invalid_certs: false,
            basic_auth: None,
        }
    }
}

/// A fully-received HTTP response with its body already parsed.
#[derive(Clone, Debug)]
pub struct FullResponse {
    pub status: u16,
    /// Parsed JSON body; `None` for 204 No Content.
    pub parsed_body: Option<Value>,
    /// The API's correlation id for this request.
    pub request_id: String,
}

/// One persistent connection to the API host.
///
/// `post` is the single entry point: it runs the bounded retry loop and
/// serializes attempts so only one write/read pair is in flight on the
/// connection at a time.
pub struct HttpTransport {
    config: TransportConfig,
    base_url: String,
    http: reqwest::Client,
    lock: Mutex<()>,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        if let Some(t) = config.connect_timeout {
            builder = builder.connect_timeout(t);
        }
        if let Some(t) = config.read_timeout {
            builder = builder.read_timeout(t);
        }
        if let Some(proxy) = &config.proxy {
            let mut p = reqwest::Proxy::all(&proxy.addr)
                .map_err(|e| TransportError::Config(format!("invalid proxy address: {e}")))?;
            if let (Some(user), Some(pass)) = (&proxy.user, &proxy.pass) {
                p = p.basic_auth(user, pass);
            }
            builder = builder.proxy(p);
        }
        if let Some(pem) = &config.ca_cert_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| TransportError::Config(format!("invalid CA certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| TransportError::Config(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url_for(&config.base_url);

        Ok(Self {
            config,
            base_url,
            http,
            lock: Mutex::new(()),
        })
    }

    /// The host this transport talks to (scheme included).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A transport with the same settings pointed at a different host.
    pub fn with_addr(&self, addr: &str) -> TransportResult<Self> {
        let mut config = self.config.clone();
        config.base_url = addr.to_string();
        Self::new(config)
    }

    /// Execute one logical POST of `body` at `path`.
    ///
    /// `id` is the caller's logical request id; each attempt is traced as
    /// `{id}/{attempt}`. One idempotency key is generated here and reused
    /// across every retry so the server can deduplicate. Retriable
    /// failures are re-attempted under exponential backoff until the
    /// configured wall-clock ceiling, after which the triggering error is
    /// returned as-is.
    pub async fn post(&self, id: &str, path: &str, body: &Value) -> TransportResult<FullResponse> {
        let started = Instant::now();
        let idempotency_key = Uuid::new_v4().to_string();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if attempt > 1 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }
            let attempt_id = format!("{id}/{attempt}");

            let result = {
                let _guard = self.lock.lock().await;
                self.attempt(&attempt_id, &idempotency_key, path, body).await
            };

            match result {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    if !err.is_retriable() || started.elapsed() >= self.config.retry_timeout {
                        return Err(err);
                    }
                    tracing::debug!(id, attempt, error = %err, "retrying request");
                }
            }
        }
    }

    async fn attempt(
        &self,
        attempt_id: &str,
        idempotency_key: &str,
        path: &str,
        body: &Value,
    ) -> TransportResult<FullResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(headers::ATTEMPT_ID, attempt_id)
            .header(headers::IDEMPOTENCY_KEY, idempotency_key)
            .header(headers::CREDENTIAL, &self.config.credential)
            .json(body);
        if let Some((user, pass)) = &self.config.basic_auth {
            req = req.basic_auth(user, Some(pass));
        }

        let response = req.send().await.map_err(network_error)?;
        let status = response.status().as_u16();

        // The API sets the correlation header on every response,
        // including errors. A response without it came from an
        // intermediary, not the ledger, and is retried as a network
        // failure whatever its status says.
        let request_id = response
            .headers()
            .get(headers::REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if request_id.is_empty() {
            return Err(TransportError::MissingRequestId { status });
        }

        let parsed_body = if status == 204 {
            None
        } else {
            let raw = response.text().await.map_err(network_error)?;
            match serde_json::from_str::<Value>(&raw) {
                Ok(v) => Some(v),
                Err(_) => {
                    return Err(TransportError::Decode {
                        attempt_id: attempt_id.to_string(),
                        body: raw,
                    })
                }
            }
        };

        if !(200..300).contains(&status) {
            let parsed: ErrorBody = parsed_body
                .as_ref()
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            let api = ApiError {
                status,
                seq_code: parsed.seq_code,
                message: parsed.message,
                detail: parsed.detail,
                retriable: parsed.retriable.unwrap_or(false),
                request_id: Some(request_id),
            };
            return Err(if status == 401 {
                TransportError::Unauthorized(api)
            } else {
                TransportError::Api(api)
            });
        }

        Ok(FullResponse {
            status,
            parsed_body,
            request_id,
        })
    }
}

fn network_error(err: reqwest::Error) -> TransportError {
    TransportError::Network {
        message: err.to_string(),
    }
}

/// Hosts discovered via hello come back as bare `host:port`; config and
/// tests may carry an explicit scheme. Default to HTTPS when none is
/// given.
fn base_url_for(addr: &str) -> String {
    let url = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("https://{addr}")
    };
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    use axum::http::{HeaderMap, StatusCode};
    use axum::response::AppendHeaders;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    const REQ_ID: (&str, &str) = (headers::REQUEST_ID, "req-test");

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn transport(base_url: &str) -> HttpTransport {
        let mut config = TransportConfig::new(base_url, "cred-secret");
        config.retry_timeout = Duration::from_secs(2);
        HttpTransport::new(config).unwrap()
    }

    #[tokio::test]
    async fn success_parses_json_body() {
        let app = Router::new().route(
            "/team/main/stats",
            post(|| async { (AppendHeaders([REQ_ID]), Json(json!({"tx_count": 7}))) }),
        );
        let base = serve(app).await;

        let resp = transport(&base)
            .post("log1", "/team/main/stats", &json!({}))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.request_id, "req-test");
        assert_eq!(resp.parsed_body.unwrap()["tx_count"], 7);
    }

    #[tokio::test]
    async fn no_content_has_empty_body() {
        let app = Router::new().route(
            "/x",
            post(|| async { (StatusCode::NO_CONTENT, AppendHeaders([REQ_ID])) }),
        );
        let base = serve(app).await;

        let resp = transport(&base).post("log1", "/x", &json!({})).await.unwrap();
        assert_eq!(resp.status, 204);
        assert!(resp.parsed_body.is_none());
    }

    #[tokio::test]
    async fn idempotency_key_stable_across_attempts_fresh_across_calls() {
        let seen: Arc<StdMutex<Vec<(String, String)>>> = Arc::default();
        let seen2 = seen.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();

        let app = Router::new().route(
            "/x",
            post(move |request_headers: HeaderMap| {
                let seen = seen2.clone();
                let hits = hits2.clone();
                async move {
                    let key = request_headers[headers::IDEMPOTENCY_KEY]
                        .to_str()
                        .unwrap()
                        .to_string();
                    let attempt = request_headers[headers::ATTEMPT_ID]
                        .to_str()
                        .unwrap()
                        .to_string();
                    seen.lock().unwrap().push((key, attempt));
                    // Fail the first two attempts with a retriable error.
                    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                        (
                            StatusCode::SERVICE_UNAVAILABLE,
                            AppendHeaders([REQ_ID]),
                            Json(json!({"message": "busy", "retriable": true})),
                        )
                    } else {
                        (StatusCode::OK, AppendHeaders([REQ_ID]), Json(json!({})))
                    }
                }
            }),
        );
        let base = serve(app).await;
        let t = transport(&base);

        t.post("call1", "/x", &json!({})).await.unwrap();
        t.post("call2", "/x", &json!({})).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        // All attempts of call1 share a key and count attempts up from 1.
        assert_eq!(seen[0].0, seen[1].0);
        assert_eq!(seen[1].0, seen[2].0);
        assert_eq!(seen[0].1, "call1/1");
        assert_eq!(seen[1].1, "call1/2");
        assert_eq!(seen[2].1, "call1/3");
        // A distinct logical call gets a distinct key.
        assert_ne!(seen[3].0, seen[0].0);
        assert_eq!(seen[3].1, "call2/1");
    }

    #[tokio::test]
    async fn non_retriable_api_error_fails_after_single_attempt() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let app = Router::new().route(
            "/x",
            post(move || {
                let hits = hits2.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::BAD_REQUEST,
                        AppendHeaders([REQ_ID]),
                        Json(json!({
                            "message": "invalid filter",
                            "retriable": false,
                            "seq_code": "SEQ008",
                        })),
                    )
                }
            }),
        );
        let base = serve(app).await;

        let err = transport(&base).post("log1", "/x", &json!({})).await.unwrap_err();
        match err {
            TransportError::Api(api) => {
                assert_eq!(api.status, 400);
                assert_eq!(api.seq_code.as_deref(), Some("SEQ008"));
                assert!(!api.retriable);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unauthorized_is_distinguished() {
        let app = Router::new().route(
            "/x",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    AppendHeaders([REQ_ID]),
                    Json(json!({"message": "bad credential"})),
                )
            }),
        );
        let base = serve(app).await;

        let err = transport(&base).post("log1", "/x", &json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn missing_correlation_header_is_retried_as_network_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let app = Router::new().route(
            "/x",
            post(move || {
                let hits = hits2.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    // A "successful" response, but without the header the
                    // ledger always sets.
                    Json(json!({}))
                }
            }),
        );
        let base = serve(app).await;

        let err = transport(&base).post("log1", "/x", &json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::MissingRequestId { status: 200 }));
        assert!(hits.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn malformed_json_is_a_terminal_decode_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let app = Router::new().route(
            "/x",
            post(move || {
                let hits = hits2.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::OK, AppendHeaders([REQ_ID]), "<html>oops</html>")
                }
            }),
        );
        let base = serve(app).await;

        let err = transport(&base).post("log1", "/x", &json!({})).await.unwrap_err();
        match err {
            TransportError::Decode { attempt_id, body } => {
                assert_eq!(attempt_id, "log1/1");
                assert!(body.contains("oops"));
            }
            other => panic!("expected Decode error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_host_errors_within_the_retry_budget() {
        // Reserve a port, then close the listener so connections are
        // refused.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = TransportConfig::new(format!("http://{addr}"), "cred");
        config.retry_timeout = Duration::from_millis(400);
        let t = HttpTransport::new(config).unwrap();

        let started = Instant::now();
        let err = t.post("log1", "/x", &json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
        // Budget is 400ms; the worst case adds one final backoff sleep.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn bare_hosts_default_to_https() {
        assert_eq!(base_url_for("api.ledger.example"), "https://api.ledger.example");
        assert_eq!(base_url_for("http://127.0.0.1:9418/"), "http://127.0.0.1:9418");

        let t = transport("ledger.internal:1999");
        assert_eq!(t.base_url(), "https://ledger.internal:1999");
        let moved = t.with_addr("other.internal:1999").unwrap();
        assert_eq!(moved.base_url(), "https://other.internal:1999");
    }

    #[tokio::test]
    async fn credential_and_content_headers_are_sent() {
        let seen: Arc<StdMutex<Option<(String, String, String)>>> = Arc::default();
        let seen2 = seen.clone();
        let app = Router::new().route(
            "/x",
            post(move |request_headers: HeaderMap| {
                let seen = seen2.clone();
                async move {
                    *seen.lock().unwrap() = Some((
                        request_headers[headers::CREDENTIAL].to_str().unwrap().to_string(),
                        request_headers["accept"].to_str().unwrap().to_string(),
                        request_headers["content-type"].to_str().unwrap().to_string(),
                    ));
                    (AppendHeaders([REQ_ID]), Json(json!({})))
                }
            }),
        );
        let base = serve(app).await;

        transport(&base).post("log1", "/x", &json!({})).await.unwrap();
        let (cred, accept, ctype) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(cred, "cred-secret");
        assert_eq!(accept, "application/json");
        assert_eq!(ctype, "application/json");
    }
}
