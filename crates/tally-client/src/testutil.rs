//! In-process ledger stubs for exercising the HTTP paths in tests.

use axum::response::{AppendHeaders, IntoResponse};
use axum::{Json, Router};
use serde_json::{json, Value};

use tally_protocol::endpoint::headers;

pub const TEAM: &str = "team";
pub const LEDGER: &str = "test";

/// Bind an ephemeral port, hand its address to `build`, and serve the
/// resulting router in the background. Returns the scheme-ful base URL.
pub async fn serve_with<F>(build: F) -> String
where
    F: FnOnce(String) -> Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let base = format!("http://{}", listener.local_addr().expect("stub addr"));
    let app = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });
    base
}

/// A JSON response carrying the correlation header the API always sets.
pub fn respond(body: Value) -> impl IntoResponse {
    (
        AppendHeaders([(headers::REQUEST_ID, "req-stub")]),
        Json(body),
    )
}

/// A hello body routing the session to `addr` under [`TEAM`].
pub fn hello_body(addr: &str, ttl_seconds: u64) -> Value {
    json!({
        "team_name": TEAM,
        "addr": addr,
        "addr_ttl_seconds": ttl_seconds,
    })
}

/// Routes shared by most stubs: hello pointing back at the stub itself,
/// with a long ttl so routing stays put for the test's duration.
pub fn with_hello(addr: String, router: Router) -> Router {
    router.route(
        "/hello",
        axum::routing::post(move || {
            let addr = addr.clone();
            async move { respond(hello_body(&addr, 600)) }
        }),
    )
}

/// Ledger-scoped path under the stub team.
pub fn ledger_route(endpoint: &str) -> String {
    format!("/{TEAM}/{LEDGER}/{endpoint}")
}
