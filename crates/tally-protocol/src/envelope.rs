use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by every list/sum endpoint.
///
/// `items` are left as raw JSON values; the client translates them into
/// the domain type for the endpoint that was queried. `cursor` is an
/// opaque token encoding the query for the next page.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageEnvelope {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub cursor: String,
    #[serde(default)]
    pub last_page: bool,
}

/// Error envelope returned with any non-2xx status.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Whether the server considers the failed request safe to retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retriable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq_code: Option<String>,
}

/// Response from the team-less `/hello` endpoint: the routing material a
/// session needs before it can address ledger-scoped paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HelloResponse {
    pub team_name: String,
    /// Current API host address, `host:port` without a scheme.
    pub addr: String,
    /// Seconds the returned routing stays fresh.
    pub addr_ttl_seconds: u64,
}

/// Response from `stream-feed-items`: a batch of raw items, each paired
/// positionally with the cursor that acknowledges consumption through it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeedItemsEnvelope {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub cursors: Vec<String>,
}

/// Body of an `ack-feed` call. `previous_cursor` lets the server reject
/// an acknowledgment that would move the durable position backward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AckFeedRequest {
    pub id: String,
    pub cursor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<String>,
}
