use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum page size accepted by the query and block endpoints.
pub const PAGE_SIZE: u32 = 100;

/// One database row: its id and raw property values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Body of `POST /databases/{id}/query`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct QueryRequest {
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

/// One page of a paginated list response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Paginated<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A content block. The type-specific payload sits under the key named by `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Block {
    /// The type-specific payload, e.g. `block["paragraph"]`.
    pub fn payload(&self) -> Option<&Value> {
        self.data.get(&self.kind)
    }
}
