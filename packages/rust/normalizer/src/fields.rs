//! Typed access to the loosely structured property bag of a database record.
//!
//! Absent or malformed fields are expected: they read as an empty string (or an
//! empty id list), never as an error.

use serde_json::{Map, Value};
use tracing::warn;

use reqgraph_notion::{Record, RecordSource};
use reqgraph_shared::TableConfig;

/// Property key used for the title when no property declares `"type": "title"`.
const DEFAULT_TITLE_KEY: &str = "Name";

/// The five fields the normalizer reads from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Rich text of the title property.
    Name,
    /// Rendered page body.
    Body,
    /// Single-select under the configured type key.
    Type,
    /// Relation under the configured parents key.
    Parents,
    /// Single-select under the configured filter key.
    Filter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Ids(Vec<String>),
}

impl FieldValue {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Ids(ids) => ids.join(","),
        }
    }
}

/// Reads [`FieldKind`]s off records using the configured property keys.
pub struct FieldReader<'a, S: ?Sized> {
    source: &'a S,
    config: &'a TableConfig,
}

impl<'a, S: RecordSource + ?Sized> FieldReader<'a, S> {
    pub fn new(source: &'a S, config: &'a TableConfig) -> Self {
        Self { source, config }
    }

    pub async fn read(&self, record: &Record, kind: FieldKind) -> FieldValue {
        match kind {
            FieldKind::Name => FieldValue::Text(self.name(record)),
            FieldKind::Body => FieldValue::Text(self.body(record).await),
            FieldKind::Type => FieldValue::Text(self.type_label(record)),
            FieldKind::Parents => FieldValue::Ids(self.parents(record)),
            FieldKind::Filter => FieldValue::Text(self.filter_value(record)),
        }
    }

    pub fn name(&self, record: &Record) -> String {
        title_text(&record.properties)
    }

    pub fn type_label(&self, record: &Record) -> String {
        select_name(&record.properties, &self.config.type_field)
    }

    pub fn filter_value(&self, record: &Record) -> String {
        select_name(&record.properties, &self.config.filter_field)
    }

    pub fn parents(&self, record: &Record) -> Vec<String> {
        relation_ids(&record.properties, &self.config.parents_field)
    }

    /// Rendered body; a failed render degrades to an empty body.
    async fn body(&self, record: &Record) -> String {
        match self.source.render_body(&record.id).await {
            Ok(body) => body,
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "failed to render record body");
                String::new()
            }
        }
    }
}

/// First element of the title property's rich text.
pub fn title_text(props: &Map<String, Value>) -> String {
    let title = props
        .values()
        .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
        .or_else(|| props.get(DEFAULT_TITLE_KEY))
        .and_then(|p| p.get("title"))
        .and_then(|t| t.get(0));

    title
        .and_then(|span| {
            span.pointer("/text/content")
                .or_else(|| span.get("plain_text"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default()
        .to_string()
}

/// `props[key].select.name`, or empty.
pub fn select_name(props: &Map<String, Value>, key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }

    props
        .get(key)
        .and_then(|p| p.pointer("/select/name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Ids referenced by `props[key].relation`, in declared order.
pub fn relation_ids(props: &Map<String, Value>, key: &str) -> Vec<String> {
    if key.is_empty() {
        return Vec::new();
    }

    props
        .get(key)
        .and_then(|p| p.get("relation"))
        .and_then(Value::as_array)
        .map(|relations| {
            relations
                .iter()
                .filter_map(|r| r.get("id").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
