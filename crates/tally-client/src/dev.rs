use serde_json::json;

use tally_protocol::endpoint::endpoints;

use crate::error::ClientResult;
use crate::session::Session;

/// Development-only ledger operations.
pub struct DevUtils<'a> {
    session: &'a Session,
}

impl<'a> DevUtils<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Delete all data in the ledger. Development ledgers only; the API
    /// rejects this on production ledgers.
    pub async fn reset(&self) -> ClientResult<()> {
        self.session.request(endpoints::RESET, &json!({})).await?;
        Ok(())
    }
}
