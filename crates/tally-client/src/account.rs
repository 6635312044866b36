use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tally_protocol::endpoint::endpoints;
use tally_protocol::query::QueryParams;

use crate::error::{ClientError, ClientResult};
use crate::page::Pager;
use crate::session::Session;
use crate::Tags;

/// A container that holds tokens in a ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier of the account.
    pub id: String,
    /// IDs of the keys that control the account.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_ids: Vec<String>,
    /// Number of keys required to sign transactions that transfer or
    /// retire tokens from the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quorum: Option<u32>,
    /// User-specified key-value data describing the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Parameters for creating an account.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewAccount {
    /// Unique identifier. Auto-generated by the ledger if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// IDs of the keys that control the account. Must be non-empty.
    pub key_ids: Vec<String>,
    /// Defaults server-side to the number of keys provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quorum: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Account operations on a ledger.
pub struct Accounts<'a> {
    session: &'a Session,
}

impl<'a> Accounts<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Create a new account in the ledger.
    pub async fn create(&self, new: NewAccount) -> ClientResult<Account> {
        if new.key_ids.is_empty() {
            return Err(ClientError::Config("key_ids cannot be empty".into()));
        }
        let body = serde_json::to_value(&new).map_err(ClientError::translate("account"))?;
        let raw = self.session.request(endpoints::CREATE_ACCOUNT, &body).await?;
        serde_json::from_value(raw).map_err(ClientError::translate("account"))
    }

    /// Replace an account's tags.
    pub async fn update_tags(&self, id: &str, tags: Option<Tags>) -> ClientResult<()> {
        if id.is_empty() {
            return Err(ClientError::Config("id cannot be blank".into()));
        }
        self.session
            .request(endpoints::UPDATE_ACCOUNT_TAGS, &json!({"id": id, "tags": tags}))
            .await?;
        Ok(())
    }

    /// Accounts matching the filter, as a lazy page sequence.
    pub fn list(
        &self,
        filter: Option<&str>,
        filter_params: Option<Vec<Value>>,
    ) -> Pager<Account> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_ACCOUNTS,
            QueryParams::filtered(filter.map(Into::into), filter_params),
        )
    }
}
