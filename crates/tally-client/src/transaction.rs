use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tally_protocol::endpoint::endpoints;
use tally_protocol::query::QueryParams;

use crate::action::Action;
use crate::error::{ClientError, ClientResult};
use crate::page::Pager;
use crate::session::Session;
use crate::Tags;

/// An atomic update to the state of the ledger: one or more actions that
/// issue, transfer, or retire tokens together.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Position of the transaction in the ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    /// User-specified key-value data embedded in the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Issue new tokens to a destination account.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IssueAction {
    pub amount: u64,
    pub flavor_id: String,
    pub destination_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_tags: Option<Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_tags: Option<Tags>,
}

/// Move tokens from a source account to a destination account.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TransferAction {
    pub amount: u64,
    pub flavor_id: String,
    pub source_account_id: String,
    pub destination_account_id: String,
    /// Token filter selecting which tokens to move.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_params: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_tags: Option<Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_tags: Option<Tags>,
}

/// Take tokens from a source account and retire them.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RetireAction {
    pub amount: u64,
    pub flavor_id: String,
    pub source_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_params: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_tags: Option<Tags>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum BuilderAction {
    Issue(IssueAction),
    Transfer(TransferAction),
    Retire(RetireAction),
}

/// Accumulates the actions and tags of a transaction before submission.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TransactionBuilder {
    actions: Vec<BuilderAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_tags: Option<Tags>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(mut self, action: IssueAction) -> Self {
        self.actions.push(BuilderAction::Issue(action));
        self
    }

    pub fn transfer(mut self, action: TransferAction) -> Self {
        self.actions.push(BuilderAction::Transfer(action));
        self
    }

    pub fn retire(mut self, action: RetireAction) -> Self {
        self.actions.push(BuilderAction::Retire(action));
        self
    }

    /// Tags embedded in the transaction itself.
    pub fn transaction_tags(mut self, tags: Tags) -> Self {
        self.transaction_tags = Some(tags);
        self
    }

    fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Transaction operations on a ledger.
pub struct Transactions<'a> {
    session: &'a Session,
}

impl<'a> Transactions<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Build, sign, and submit a transaction atomically.
    pub async fn transact(&self, builder: TransactionBuilder) -> ClientResult<Transaction> {
        if builder.is_empty() {
            return Err(ClientError::Config(
                "transaction must contain at least one action".into(),
            ));
        }
        let body =
            serde_json::to_value(&builder).map_err(ClientError::translate("transaction"))?;
        let raw = self.session.request(endpoints::TRANSACT, &body).await?;
        serde_json::from_value(raw).map_err(ClientError::translate("transaction"))
    }

    /// Transactions matching the filter, as a lazy page sequence.
    pub fn list(
        &self,
        filter: Option<&str>,
        filter_params: Option<Vec<Value>>,
    ) -> Pager<Transaction> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_TRANSACTIONS,
            QueryParams::filtered(filter.map(Into::into), filter_params),
        )
    }
}
