use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for a list/sum query.
///
/// The cursor returned with each page already encodes the full query, so
/// a query built with [`QueryParams::from_cursor`] carries nothing else.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Values interpolated into the filter expression's placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_params: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl QueryParams {
    pub fn filtered(filter: Option<String>, filter_params: Option<Vec<Value>>) -> Self {
        Self {
            filter,
            filter_params,
            ..Self::default()
        }
    }

    /// A query that resumes from an opaque cursor, discarding every other
    /// field (the cursor already encodes them).
    pub fn from_cursor(cursor: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            ..Self::default()
        }
    }

    pub fn is_cursor_only(&self) -> bool {
        self.cursor.is_some()
            && self.filter.is_none()
            && self.filter_params.is_none()
            && self.group_by.is_none()
            && self.page_size.is_none()
    }
}
