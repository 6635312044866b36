use serde::{Deserialize, Serialize};
use serde_json::Value;

use tally_protocol::endpoint::endpoints;
use tally_protocol::query::QueryParams;

use crate::page::Pager;
use crate::session::Session;
use crate::Tags;

/// A group of identical tokens: same flavor, same account, same tags.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenGroup {
    /// Number of tokens in the group.
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_tags: Option<Tags>,
    /// Account containing the tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// A summed row of tokens. Fields other than `amount` are present only
/// when named in the query's `group_by`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenSum {
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_tags: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Token queries on a ledger.
pub struct Tokens<'a> {
    session: &'a Session,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Token groups matching the filter.
    pub fn list(
        &self,
        filter: Option<&str>,
        filter_params: Option<Vec<Value>>,
    ) -> Pager<TokenGroup> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_TOKENS,
            QueryParams::filtered(filter.map(Into::into), filter_params),
        )
    }

    /// Sum matching token amounts, grouped by the given fields.
    pub fn sum(
        &self,
        filter: Option<&str>,
        filter_params: Option<Vec<Value>>,
        group_by: Option<Vec<String>>,
    ) -> Pager<TokenSum> {
        let mut query = QueryParams::filtered(filter.map(Into::into), filter_params);
        query.group_by = group_by;
        Pager::new(self.session.clone(), endpoints::SUM_TOKENS, query)
    }
}
