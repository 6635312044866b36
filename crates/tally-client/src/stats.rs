use serde::{Deserialize, Serialize};
use serde_json::json;

use tally_protocol::endpoint::endpoints;

use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Summary information about a ledger.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub flavor_count: u64,
    #[serde(default)]
    pub account_count: u64,
    #[serde(default)]
    pub tx_count: u64,
    /// "dev" or "prod".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_type: Option<String>,
}

/// Ledger-level statistics.
pub struct StatsModule<'a> {
    session: &'a Session,
}

impl<'a> StatsModule<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn get(&self) -> ClientResult<Stats> {
        let raw = self.session.request(endpoints::STATS, &json!({})).await?;
        serde_json::from_value(raw).map_err(ClientError::translate("stats"))
    }
}
