use serde::{Deserialize, Serialize};
use serde_json::json;

use tally_protocol::endpoint::endpoints;
use tally_protocol::query::QueryParams;

use crate::error::{ClientError, ClientResult};
use crate::page::Pager;
use crate::session::Session;

/// What an index precomputes over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Action,
    Token,
}

/// A precomputed query. When a list/sum call's filter and group-by match
/// a defined index, the server answers from precomputed storage instead
/// of scanning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Index {
    pub id: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
    /// The filter expression the index precomputes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<String>>,
}

/// Parameters for creating an index.
#[derive(Clone, Debug, Serialize)]
pub struct NewIndex {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub index_type: IndexType,
    pub filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<String>>,
}

/// Index operations on a ledger.
pub struct Indexes<'a> {
    session: &'a Session,
}

impl<'a> Indexes<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn create(&self, new: NewIndex) -> ClientResult<Index> {
        if new.filter.is_empty() {
            return Err(ClientError::Config("filter cannot be blank".into()));
        }
        let body = serde_json::to_value(&new).map_err(ClientError::translate("index"))?;
        let raw = self.session.request(endpoints::CREATE_INDEX, &body).await?;
        serde_json::from_value(raw).map_err(ClientError::translate("index"))
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        if id.is_empty() {
            return Err(ClientError::Config("id cannot be blank".into()));
        }
        self.session
            .request(endpoints::DELETE_INDEX, &json!({"id": id}))
            .await?;
        Ok(())
    }

    /// All indexes defined on the ledger.
    pub fn list(&self) -> Pager<Index> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_INDEXES,
            QueryParams::default(),
        )
    }
}
