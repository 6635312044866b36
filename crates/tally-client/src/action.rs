use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tally_protocol::endpoint::endpoints;
use tally_protocol::query::QueryParams;

use crate::error::{ClientError, ClientResult};
use crate::page::Pager;
use crate::session::Session;
use crate::Tags;

/// One action taken by a transaction: an issuance, transfer, or
/// retirement.
///
/// The same shape serves both `list` and `sum` queries. A sum row
/// carries the summed `amount` plus whichever fields the query grouped
/// by; everything else is absent, which is why every field here is
/// optional.
///
/// Timestamps are carried as RFC 3339 and re-serialized in UTC, so a
/// response written with an offset comes back normalized.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// "issue", "transfer", or "retire".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    /// Amount of the action, or the summed amount of the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    /// ID of the transaction in which the action appears.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<String>,
    /// Associated tags as they existed at transaction time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ActionSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<String>,
    /// User-specified key-value data embedded in the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// A copy of the tags associated with an action, captured when its
/// transaction was committed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_tags: Option<Tags>,
}

/// Action queries on a ledger.
pub struct Actions<'a> {
    session: &'a Session,
}

impl<'a> Actions<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Actions matching the filter, as a lazy page sequence.
    pub fn list(&self, filter: Option<&str>, filter_params: Option<Vec<Value>>) -> Pager<Action> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_ACTIONS,
            QueryParams::filtered(filter.map(Into::into), filter_params),
        )
    }

    /// Sum matching action amounts, grouped by the given fields.
    pub fn sum(
        &self,
        filter: Option<&str>,
        filter_params: Option<Vec<Value>>,
        group_by: Option<Vec<String>>,
    ) -> Pager<Action> {
        let mut query = QueryParams::filtered(filter.map(Into::into), filter_params);
        query.group_by = group_by;
        Pager::new(self.session.clone(), endpoints::SUM_ACTIONS, query)
    }

    /// Replace an action's tags.
    pub async fn update_tags(&self, id: &str, tags: Option<Tags>) -> ClientResult<()> {
        if id.is_empty() {
            return Err(ClientError::Config("id cannot be blank".into()));
        }
        self.session
            .request(endpoints::UPDATE_ACTION_TAGS, &json!({"id": id, "tags": tags}))
            .await?;
        Ok(())
    }
}
