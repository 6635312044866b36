use serde::{Deserialize, Serialize};

use tally_protocol::endpoint::endpoints;
use tally_protocol::query::QueryParams;

use crate::error::{ClientError, ClientResult};
use crate::page::Pager;
use crate::session::Session;

/// A signing key registered with the ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Key {
    /// Unique identifier, derived from the public key material itself
    /// when not user-specified.
    pub id: String,
}

/// Parameters for creating a key.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Key operations on a ledger.
pub struct Keys<'a> {
    session: &'a Session,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn create(&self, new: NewKey) -> ClientResult<Key> {
        let body = serde_json::to_value(&new).map_err(ClientError::translate("key"))?;
        let raw = self.session.request(endpoints::CREATE_KEY, &body).await?;
        serde_json::from_value(raw).map_err(ClientError::translate("key"))
    }

    /// All keys in the ledger.
    pub fn list(&self) -> Pager<Key> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_KEYS,
            QueryParams::default(),
        )
    }
}
