use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use uuid::Uuid;

use tally_protocol::endpoint::endpoints;
use tally_protocol::envelope::HelloResponse;
use tally_transport::{FullResponse, HttpTransport};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Routing material derived from the hello endpoint. Immutable once
/// built; the session swaps whole snapshots, never fields.
struct Routing {
    team_name: String,
    addr: String,
    transport: Arc<HttpTransport>,
}

struct SessionState {
    routing: Option<Arc<Routing>>,
    /// When the current routing goes stale. Construction leaves it in
    /// the past so the first request refreshes inline.
    deadline: Instant,
}

struct SessionInner {
    config: ClientConfig,
    /// Feed sessions skip the per-attempt read timeout (long-poll).
    long_poll: bool,
    state: Mutex<SessionState>,
}

/// One authenticated binding to a ledger.
///
/// Owns the transport, the hello-derived routing (team name and host
/// address), and the refresh deadline. Requests past the deadline
/// trigger an asynchronous refresh and proceed on the previous routing;
/// only the very first request, which has no routing yet, refreshes
/// inline. Cloning shares the underlying connection; [`Session::fork`]
/// gets a dedicated one.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub(crate) fn new(config: ClientConfig) -> Self {
        Self::with_long_poll(config, false)
    }

    fn with_long_poll(config: ClientConfig, long_poll: bool) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                long_poll,
                state: Mutex::new(SessionState {
                    routing: None,
                    deadline: Instant::now(),
                }),
            }),
        }
    }

    /// A session against the same ledger with its own transport
    /// connection, so a feed's blocking long-poll cannot starve other
    /// request traffic. The fork starts with no routing and performs its
    /// own hello on first use.
    pub fn fork(&self) -> Session {
        Self::with_long_poll(self.inner.config.clone(), true)
    }

    /// POST `body` at the ledger-scoped `path`, returning the parsed
    /// response body.
    pub async fn request(&self, path: &str, body: &Value) -> ClientResult<Value> {
        let resp = self.request_full(None, path, body).await?;
        Ok(resp.parsed_body.unwrap_or(Value::Null))
    }

    /// Like [`Session::request`], with an explicit logical request id and
    /// the full response (status and correlation id included).
    pub async fn request_full(
        &self,
        id: Option<&str>,
        path: &str,
        body: &Value,
    ) -> ClientResult<FullResponse> {
        let routing = self.routing().await?;
        let path = ledger_path(
            &routing.team_name,
            &self.inner.config.ledger_name,
            path,
        );
        let generated;
        let id = match id {
            Some(id) => id,
            None => {
                generated = random_request_id();
                &generated
            }
        };
        Ok(routing.transport.post(id, &path, body).await?)
    }

    /// Current routing, refreshing per the deadline policy.
    async fn routing(&self) -> ClientResult<Arc<Routing>> {
        enum Plan {
            Use(Arc<Routing>),
            RefreshInline,
            RefreshBehind(Arc<Routing>),
        }

        let plan = {
            let mut state = self.inner.state.lock().expect("session lock poisoned");
            match &state.routing {
                None => Plan::RefreshInline,
                Some(routing) => {
                    let routing = routing.clone();
                    if Instant::now() >= state.deadline {
                        // Extend the deadline so concurrent requests
                        // don't all trigger redundant refreshes while
                        // this one is in flight.
                        state.deadline = Instant::now() + self.inner.config.retry_timeout;
                        Plan::RefreshBehind(routing)
                    } else {
                        Plan::Use(routing)
                    }
                }
            }
        };

        match plan {
            Plan::Use(routing) => Ok(routing),
            Plan::RefreshInline => self.refresh().await,
            Plan::RefreshBehind(routing) => {
                let session = self.clone();
                tokio::spawn(async move {
                    // Refresh failure is non-fatal: the previous routing
                    // stays usable and the next request past the deadline
                    // tries again.
                    if let Err(err) = session.refresh().await {
                        tracing::debug!(error = %err, "hello refresh failed; keeping previous routing");
                    }
                });
                Ok(routing)
            }
        }
    }

    /// Call the hello endpoint and swap in a fresh routing snapshot.
    async fn refresh(&self) -> ClientResult<Arc<Routing>> {
        let (current_transport, current_addr) = {
            let state = self.inner.state.lock().expect("session lock poisoned");
            match &state.routing {
                Some(r) => (Some(r.transport.clone()), r.addr.clone()),
                None => (None, self.inner.config.initial_addr().to_string()),
            }
        };
        let transport = match current_transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(
                self.inner
                    .config
                    .transport_config(&current_addr, self.inner.long_poll),
            )?),
        };

        let resp = transport
            .post(&random_request_id(), endpoints::HELLO, &json!({}))
            .await?;
        let hello: HelloResponse =
            serde_json::from_value(resp.parsed_body.unwrap_or(Value::Null)).map_err(|source| {
                ClientError::Translate {
                    entity: "hello",
                    source,
                }
            })?;

        // An unchanged addr keeps the established connection; a new addr
        // gets a fresh transport pointed at it.
        let transport = if hello.addr == current_addr {
            transport
        } else {
            Arc::new(transport.with_addr(&hello.addr)?)
        };

        let routing = Arc::new(Routing {
            team_name: hello.team_name,
            addr: hello.addr,
            transport,
        });
        let mut state = self.inner.state.lock().expect("session lock poisoned");
        state.routing = Some(routing.clone());
        state.deadline = Instant::now() + Duration::from_secs(hello.addr_ttl_seconds);
        Ok(routing)
    }

    /// The host the session currently talks to, for diagnostics.
    pub fn current_addr(&self) -> Option<String> {
        let state = self.inner.state.lock().expect("session lock poisoned");
        state.routing.as_ref().map(|r| r.addr.clone())
    }
}

fn ledger_path(team: &str, ledger: &str, path: &str) -> String {
    format!("/{team}/{ledger}/{}", path.trim_start_matches('/'))
}

fn random_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;
    use crate::testutil::{hello_body, respond, serve_with, LEDGER};

    fn session_for(base: &str) -> Session {
        let mut config = ClientConfig::new(LEDGER, "cred");
        config.addr = Some(base.to_string());
        config.retry_timeout = Duration::from_secs(2);
        Session::new(config)
    }

    #[test]
    fn ledger_paths_collapse_duplicate_separators() {
        assert_eq!(ledger_path("team", "test", "stats"), "/team/test/stats");
        assert_eq!(ledger_path("team", "test", "/reset"), "/team/test/reset");
        assert_eq!(ledger_path("team", "test", "//reset"), "/team/test/reset");
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(random_request_id(), random_request_id());
    }

    #[tokio::test]
    async fn first_request_refreshes_inline_then_routes_by_team() {
        let base = serve_with(|addr| {
            Router::new()
                .route(
                    "/hello",
                    post(move || {
                        let addr = addr.clone();
                        async move { respond(hello_body(&addr, 600)) }
                    }),
                )
                .route(
                    "/team/test/stats",
                    post(|| async { respond(serde_json::json!({"tx_count": 3})) }),
                )
        })
        .await;

        let session = session_for(&base);
        let stats = session
            .request("stats", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(stats["tx_count"], 3);
        assert_eq!(session.current_addr().unwrap(), base);
    }

    #[tokio::test]
    async fn expired_deadline_refreshes_behind_the_request() {
        let hellos = Arc::new(AtomicUsize::new(0));
        let hellos2 = hellos.clone();
        let base = serve_with(move |addr| {
            Router::new()
                .route(
                    "/hello",
                    post(move || {
                        let addr = addr.clone();
                        let hellos = hellos2.clone();
                        async move {
                            hellos.fetch_add(1, Ordering::SeqCst);
                            // ttl 0: the routing is stale immediately.
                            respond(hello_body(&addr, 0))
                        }
                    }),
                )
                .route("/team/test/stats", post(|| async { respond(serde_json::json!({})) }))
        })
        .await;

        let session = session_for(&base);
        session.request("stats", &serde_json::json!({})).await.unwrap();
        assert_eq!(hellos.load(Ordering::SeqCst), 1);

        // Past the deadline: the request proceeds on the old routing and
        // a background refresh fires.
        session.request("stats", &serde_json::json!({})).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hellos.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn addr_change_moves_subsequent_requests() {
        // Second host serves the ledger after the refresh points at it.
        let second = serve_with(|_addr| {
            Router::new()
                .route("/team/test/stats", post(|| async { respond(serde_json::json!({"host": 2})) }))
        })
        .await;

        let second2 = second.clone();
        let first = serve_with(move |addr| {
            let second = second2.clone();
            Router::new()
                .route(
                    "/hello",
                    post(move |Json(_): Json<Value>| {
                        let addr = addr.clone();
                        let second = second.clone();
                        static CALLS: AtomicUsize = AtomicUsize::new(0);
                        async move {
                            // First hello: stay here with ttl 0. Later
                            // hellos: move to the second host.
                            if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                                respond(hello_body(&addr, 0))
                            } else {
                                respond(hello_body(&second, 600))
                            }
                        }
                    }),
                )
                .route("/team/test/stats", post(|| async { respond(serde_json::json!({"host": 1})) }))
        })
        .await;

        let session = session_for(&first);
        let body = session.request("stats", &serde_json::json!({})).await.unwrap();
        assert_eq!(body["host"], 1);

        // Trigger the background refresh, let it land, then observe the
        // new host serving requests.
        session.request("stats", &serde_json::json!({})).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(session.current_addr().unwrap(), second);
        let body = session.request("stats", &serde_json::json!({})).await.unwrap();
        assert_eq!(body["host"], 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_routing() {
        let base = serve_with(|addr| {
            Router::new()
                .route(
                    "/hello",
                    post(move || {
                        let addr = addr.clone();
                        static CALLS: AtomicUsize = AtomicUsize::new(0);
                        async move {
                            if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                                respond(hello_body(&addr, 0)).into_response()
                            } else {
                                // Non-retriable failure: the refresh task
                                // gives up and keeps the old routing.
                                (
                                    StatusCode::INTERNAL_SERVER_ERROR,
                                    respond(serde_json::json!({
                                        "message": "hello broken",
                                        "retriable": false,
                                    })),
                                )
                                    .into_response()
                            }
                        }
                    }),
                )
                .route("/team/test/stats", post(|| async { respond(serde_json::json!({"ok": true})) }))
        })
        .await;

        let session = session_for(&base);
        session.request("stats", &serde_json::json!({})).await.unwrap();
        session.request("stats", &serde_json::json!({})).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Routing unchanged, requests still served.
        assert_eq!(session.current_addr().unwrap(), base);
        let body = session.request("stats", &serde_json::json!({})).await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn forked_session_routes_independently() {
        let hellos = Arc::new(AtomicUsize::new(0));
        let hellos2 = hellos.clone();
        let base = serve_with(move |addr| {
            Router::new()
                .route(
                    "/hello",
                    post(move || {
                        let addr = addr.clone();
                        let hellos = hellos2.clone();
                        async move {
                            hellos.fetch_add(1, Ordering::SeqCst);
                            respond(hello_body(&addr, 600))
                        }
                    }),
                )
                .route("/team/test/stats", post(|| async { respond(serde_json::json!({})) }))
        })
        .await;

        let session = session_for(&base);
        session.request("stats", &serde_json::json!({})).await.unwrap();

        let fork = session.fork();
        fork.request("stats", &serde_json::json!({})).await.unwrap();

        // The fork performed its own hello on its own connection.
        assert_eq!(hellos.load(Ordering::SeqCst), 2);
        assert_eq!(fork.current_addr(), session.current_addr());
    }
}
