/// Endpoint paths for the Tally ledger API.
///
/// Ledger-scoped paths are joined under `/<team>/<ledger>/` by the
/// session; `HELLO` is team-less and hits the API root directly.
pub mod endpoints {
    pub const HELLO: &str = "/hello";

    pub const CREATE_ACCOUNT: &str = "create-account";
    pub const UPDATE_ACCOUNT_TAGS: &str = "update-account-tags";
    pub const LIST_ACCOUNTS: &str = "list-accounts";

    pub const LIST_ACTIONS: &str = "list-actions";
    pub const SUM_ACTIONS: &str = "sum-actions";
    pub const UPDATE_ACTION_TAGS: &str = "update-action-tags";

    pub const CREATE_FLAVOR: &str = "create-flavor";
    pub const UPDATE_FLAVOR_TAGS: &str = "update-flavor-tags";
    pub const LIST_FLAVORS: &str = "list-flavors";

    pub const CREATE_KEY: &str = "create-key";
    pub const LIST_KEYS: &str = "list-keys";

    pub const LIST_TOKENS: &str = "list-tokens";
    pub const SUM_TOKENS: &str = "sum-tokens";

    pub const TRANSACT: &str = "transact";
    pub const LIST_TRANSACTIONS: &str = "list-transactions";

    pub const CREATE_INDEX: &str = "create-index";
    pub const DELETE_INDEX: &str = "delete-index";
    pub const LIST_INDEXES: &str = "list-indexes";

    pub const CREATE_FEED: &str = "create-feed";
    pub const GET_FEED: &str = "get-feed";
    pub const DELETE_FEED: &str = "delete-feed";
    pub const LIST_FEEDS: &str = "list-feeds";
    pub const STREAM_FEED_ITEMS: &str = "stream-feed-items";
    pub const ACK_FEED: &str = "ack-feed";

    pub const STATS: &str = "stats";
    pub const RESET: &str = "/reset";
}

/// HTTP header names used by the Tally API.
pub mod headers {
    /// Per-attempt trace id, `{logical_id}/{attempt}`.
    pub const ATTEMPT_ID: &str = "Id";

    /// Deduplication key, stable across all retries of one logical call.
    pub const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

    /// API credential secret.
    pub const CREDENTIAL: &str = "Credential";

    /// Correlation id set by the API on every response. Its absence means
    /// the request stopped at some intermediary (a misconfigured proxy or
    /// load balancer) and is treated as a network error by the transport.
    pub const REQUEST_ID: &str = "Tally-Request-Id";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_scoped_paths_have_no_leading_slash() {
        assert_eq!(endpoints::CREATE_ACCOUNT, "create-account");
        assert_eq!(endpoints::STREAM_FEED_ITEMS, "stream-feed-items");
        assert_eq!(endpoints::ACK_FEED, "ack-feed");
        assert_eq!(endpoints::STATS, "stats");
    }

    #[test]
    fn root_paths_are_absolute() {
        assert_eq!(endpoints::HELLO, "/hello");
        assert_eq!(endpoints::RESET, "/reset");
    }

    #[test]
    fn header_names() {
        assert_eq!(headers::REQUEST_ID, "Tally-Request-Id");
        assert_eq!(headers::IDEMPOTENCY_KEY, "Idempotency-Key");
    }
}
