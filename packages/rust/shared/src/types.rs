//! Canonical schema types shared by the crawler and the table normalizer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Document type stamped on every exported artifact.
pub const ARTIFACT_TREE: &str = "ARTIFACT_TREE";

// ---------------------------------------------------------------------------
// Site pages
// ---------------------------------------------------------------------------

/// One table row scraped from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Trimmed text of the row.
    pub name: String,
    /// Absolute URL of the row's link, or empty.
    #[serde(default)]
    pub url: String,
}

/// Structured content extracted from a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page heading, or the page URL when the page has none.
    pub name: String,
    /// Rows per section title, in table order.
    #[serde(default)]
    pub sections: IndexMap<String, Vec<Row>>,
}

/// Successfully scraped pages keyed by URL, in scrape order.
pub type RawPages = IndexMap<String, PageContent>;

// ---------------------------------------------------------------------------
// Artifacts and trace links
// ---------------------------------------------------------------------------

/// Canonical normalized requirement unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Assigned by the import target.
    pub id: Option<String>,
    pub name: String,
    pub body: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub summary: String,
    pub logic_type: Option<String>,
    pub safety_case_type: Option<String>,
    pub document_type: String,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub document_ids: Vec<String>,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        body: impl Into<String>,
        artifact_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            body: body.into(),
            artifact_type: artifact_type.into(),
            summary: String::new(),
            logic_type: None,
            safety_case_type: None,
            document_type: ARTIFACT_TREE.to_string(),
            attributes: serde_json::Map::new(),
            document_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceType {
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Approved,
}

/// Directed link from a child artifact (source) to its parent (target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceLink {
    pub id: Option<String>,
    pub trace_link_id: Option<String>,
    pub trace_type: TraceType,
    pub approval_status: ApprovalStatus,
    pub score: u32,
    pub source_id: Option<String>,
    pub source_name: String,
    pub target_id: Option<String>,
    pub target_name: String,
}

impl TraceLink {
    /// A manually declared, approved link between two artifacts by name.
    pub fn manual(source_name: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            id: None,
            trace_link_id: None,
            trace_type: TraceType::Manual,
            approval_status: ApprovalStatus::Approved,
            score: 1,
            source_id: None,
            source_name: source_name.into(),
            target_id: None,
            target_name: target_name.into(),
        }
    }
}

/// `{"artifacts": [...]}` wrapper persisted by the table export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDocument {
    pub artifacts: Vec<Artifact>,
}

/// `{"traces": [...]}` wrapper persisted by the table export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceDocument {
    pub traces: Vec<TraceLink>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_pages_keep_scrape_order() {
        let mut pages = RawPages::new();
        for url in ["https://z.test/seed.html", "https://a.test/child.html"] {
            pages.insert(
                url.to_string(),
                PageContent {
                    name: url.into(),
                    sections: IndexMap::new(),
                },
            );
        }

        let json = serde_json::to_string(&pages).unwrap();
        let parsed: RawPages = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed.keys().collect::<Vec<_>>(),
            vec!["https://z.test/seed.html", "https://a.test/child.html"]
        );

        // Untyped values keep document order too.
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["https://z.test/seed.html", "https://a.test/child.html"]);
    }

    #[test]
    fn artifact_schema_shape() {
        let artifact = Artifact::new("REQ-1", "body text", "Notion Requirement");
        let value = serde_json::to_value(&artifact).unwrap();

        assert_eq!(
            value,
            json!({
                "id": null,
                "name": "REQ-1",
                "body": "body text",
                "type": "Notion Requirement",
                "summary": "",
                "logicType": null,
                "safetyCaseType": null,
                "documentType": "ARTIFACT_TREE",
                "attributes": {},
                "documentIds": []
            })
        );
    }

    #[test]
    fn trace_link_schema_shape() {
        let link = TraceLink::manual("child", "parent");
        let value = serde_json::to_value(&link).unwrap();

        assert_eq!(
            value,
            json!({
                "id": null,
                "traceLinkId": null,
                "traceType": "MANUAL",
                "approvalStatus": "APPROVED",
                "score": 1,
                "sourceId": null,
                "sourceName": "child",
                "targetId": null,
                "targetName": "parent"
            })
        );
    }

    #[test]
    fn page_content_serialization() {
        let mut sections = IndexMap::new();
        sections.insert(
            "Requirements".to_string(),
            vec![Row {
                name: "R1".into(),
                url: "https://example.com/r1.html".into(),
            }],
        );
        let page = PageContent {
            name: "Program".into(),
            sections,
        };

        let json = serde_json::to_string(&page).unwrap();
        let parsed: PageContent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, page);
        assert!(json.contains(r#""sections":{"Requirements":[{"#));
    }
}
