use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tally_protocol::endpoint::endpoints;
use tally_protocol::query::QueryParams;

use crate::error::{ClientError, ClientResult};
use crate::page::Pager;
use crate::session::Session;
use crate::Tags;

/// A type or class of value that can be tracked on a ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flavor {
    /// Unique identifier of the flavor.
    pub id: String,
    /// IDs of the keys used to sign transactions issuing tokens of the
    /// flavor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quorum: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Parameters for creating a flavor.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewFlavor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Must be non-empty.
    pub key_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quorum: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// Flavor operations on a ledger.
pub struct Flavors<'a> {
    session: &'a Session,
}

impl<'a> Flavors<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn create(&self, new: NewFlavor) -> ClientResult<Flavor> {
        if new.key_ids.is_empty() {
            return Err(ClientError::Config("key_ids cannot be empty".into()));
        }
        let body = serde_json::to_value(&new).map_err(ClientError::translate("flavor"))?;
        let raw = self.session.request(endpoints::CREATE_FLAVOR, &body).await?;
        serde_json::from_value(raw).map_err(ClientError::translate("flavor"))
    }

    /// Replace a flavor's tags.
    pub async fn update_tags(&self, id: &str, tags: Option<Tags>) -> ClientResult<()> {
        if id.is_empty() {
            return Err(ClientError::Config("id cannot be blank".into()));
        }
        self.session
            .request(endpoints::UPDATE_FLAVOR_TAGS, &json!({"id": id, "tags": tags}))
            .await?;
        Ok(())
    }

    pub fn list(&self, filter: Option<&str>, filter_params: Option<Vec<Value>>) -> Pager<Flavor> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_FLAVORS,
            QueryParams::filtered(filter.map(Into::into), filter_params),
        )
    }
}
