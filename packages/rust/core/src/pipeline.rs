//! End-to-end pipelines.
//!
//! - `crawl_site`: navigation index → worklist crawl → raw pages document
//! - `export_table`: database query → normalize → artifact + trace documents

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use reqgraph_crawler::{PageFetcher, SiteCrawler};
use reqgraph_normalizer::normalize_table;
use reqgraph_notion::RecordSource;
use reqgraph_shared::{
    ArtifactDocument, ProgressReporter, Result, SiteConfig, TableConfig, TraceDocument,
};
use reqgraph_storage::JsonStore;

/// Result of the `crawl_site` pipeline.
#[derive(Debug)]
pub struct SiteCrawlReport {
    /// Path of the persisted raw pages document.
    pub output_path: PathBuf,
    /// Number of pages scraped.
    pub page_count: usize,
    /// Pages that failed to scrape (URL, error message).
    pub failures: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Result of the `export_table` pipeline.
#[derive(Debug)]
pub struct TableExportReport {
    pub artifacts_path: PathBuf,
    pub traces_path: PathBuf,
    pub artifact_count: usize,
    pub trace_count: usize,
    pub elapsed: Duration,
}

/// Name of the artifact document for an artifact type label.
pub fn artifact_document_name(artifact_type: &str) -> String {
    artifact_type.to_string()
}

/// Name of the trace document linking an artifact type to itself.
pub fn trace_document_name(artifact_type: &str) -> String {
    format!("{artifact_type}2{artifact_type}")
}

/// Crawl the documentation site and persist the raw pages map.
#[instrument(skip_all, fields(index = %site.index_url))]
pub async fn crawl_site<F>(
    fetcher: &F,
    site: &SiteConfig,
    store: &JsonStore,
    progress: &dyn ProgressReporter,
) -> Result<SiteCrawlReport>
where
    F: PageFetcher + ?Sized,
{
    let start = Instant::now();

    let result = SiteCrawler::new(fetcher, site).crawl(progress).await?;

    progress.phase("Exporting data");
    let output_path = store.persist(&site.output_name, &result.pages)?;

    let report = SiteCrawlReport {
        output_path,
        page_count: result.pages.len(),
        failures: result.errors,
        elapsed: start.elapsed(),
    };
    progress.finish();

    info!(
        pages = report.page_count,
        failures = report.failures.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "site crawl pipeline complete"
    );

    Ok(report)
}

/// Normalize the configured database table and persist both documents.
#[instrument(skip_all, fields(table_id = %table.table_id))]
pub async fn export_table<S>(
    source: &S,
    table: &TableConfig,
    store: &JsonStore,
    progress: &dyn ProgressReporter,
) -> Result<TableExportReport>
where
    S: RecordSource + ?Sized,
{
    let start = Instant::now();

    let normalized = normalize_table(source, table, progress).await;

    progress.phase("Storing requirement data");
    info!(
        artifacts = normalized.artifacts.len(),
        traces = normalized.traces.len(),
        "storing requirement data"
    );

    let artifact_count = normalized.artifacts.len();
    let trace_count = normalized.traces.len();

    let artifacts_path = store.persist(
        &artifact_document_name(&table.artifact_type),
        &ArtifactDocument {
            artifacts: normalized.artifacts,
        },
    )?;
    let traces_path = store.persist(
        &trace_document_name(&table.artifact_type),
        &TraceDocument {
            traces: normalized.traces,
        },
    )?;

    progress.finish();

    Ok(TableExportReport {
        artifacts_path,
        traces_path,
        artifact_count,
        trace_count,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use reqgraph_notion::Record;
    use reqgraph_shared::{RawPages, ReqGraphError, SilentProgress};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    struct StaticSite(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for StaticSite {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| ReqGraphError::Network(format!("{url}: HTTP 404")))
        }
    }

    struct StaticTable(Vec<Record>);

    #[async_trait]
    impl RecordSource for StaticTable {
        async fn query_all(&self, _collection_id: &str) -> Result<Vec<Record>> {
            Ok(self.0.clone())
        }

        async fn render_body(&self, _record_id: &str) -> Result<String> {
            Ok("body".into())
        }
    }

    fn temp_store(label: &str) -> JsonStore {
        JsonStore::new(std::env::temp_dir().join(format!("reqgraph-{label}-{}", Uuid::now_v7())))
    }

    fn record(id: &str, name: &str, parents: &[&str]) -> Record {
        let relation: Vec<_> = parents.iter().map(|p| json!({ "id": p })).collect();
        Record {
            id: id.into(),
            properties: json!({
                "Name": { "type": "title", "title": [{ "text": { "content": name } }] },
                "Parents": { "type": "relation", "relation": relation }
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        }
    }

    #[test]
    fn document_names() {
        assert_eq!(artifact_document_name("Notion Requirement"), "Notion Requirement");
        assert_eq!(
            trace_document_name("Notion Requirement"),
            "Notion Requirement2Notion Requirement"
        );
    }

    #[tokio::test]
    async fn crawl_site_persists_raw_pages() {
        let site = SiteConfig {
            index_url: "https://site.test/navigation.html".into(),
            url_prefix: "https://site.test/".into(),
            program_path_prefix: "programs/".into(),
            output_name: "site_raw".into(),
            ..SiteConfig::default()
        };
        let fetcher = StaticSite(HashMap::from([
            (
                "https://site.test/navigation.html".to_string(),
                r#"<a href="programs/a.html">A</a><a href="programs/b.html">B</a>"#.to_string(),
            ),
            (
                "https://site.test/programs/a.html".to_string(),
                "<h2>Program A</h2><h3>Reqs</h3><table><tr><td>R1</td></tr></table>".to_string(),
            ),
        ]));
        let store = temp_store("crawl");

        let report = crawl_site(&fetcher, &site, &store, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.page_count, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "https://site.test/programs/b.html");
        assert!(report.output_path.ends_with("site_raw.json"));

        let pages: RawPages = store.load("site_raw").unwrap();
        let page = pages.get("https://site.test/programs/a.html").unwrap();
        assert_eq!(page.name, "Program A");
        assert_eq!(page.sections.get("Reqs").unwrap()[0].name, "R1");

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn export_table_writes_both_documents() {
        let source = StaticTable(vec![
            record("p", "Parent", &[]),
            record("c", "Child", &["p", "ghost"]),
        ]);
        let table = TableConfig {
            table_id: "db".into(),
            parents_field: "Parents".into(),
            artifact_type: "Notion Requirement".into(),
            ..TableConfig::default()
        };
        let store = temp_store("export");

        let report = export_table(&source, &table, &store, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.artifact_count, 2);
        assert_eq!(report.trace_count, 1);
        assert!(report.artifacts_path.ends_with("Notion Requirement.json"));
        assert!(
            report
                .traces_path
                .ends_with("Notion Requirement2Notion Requirement.json")
        );

        let artifacts = store.load_value("Notion Requirement").unwrap();
        assert_eq!(artifacts["artifacts"][1]["name"], "Child");
        assert_eq!(artifacts["artifacts"][1]["type"], "Notion Requirement");
        assert_eq!(artifacts["artifacts"][1]["body"], "body");

        let traces: TraceDocument = store.load("Notion Requirement2Notion Requirement").unwrap();
        assert_eq!(traces.traces[0].source_name, "Child");
        assert_eq!(traces.traces[0].target_name, "Parent");

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn persistence_failure_is_fatal() {
        // A regular file where the data directory should be.
        let blocker = std::env::temp_dir().join(format!("reqgraph-blocker-{}", Uuid::now_v7()));
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = JsonStore::new(blocker.join("data"));

        let source = StaticTable(vec![record("p", "Parent", &[])]);
        let table = TableConfig {
            artifact_type: "Notion Requirement".into(),
            ..TableConfig::default()
        };

        let result = export_table(&source, &table, &store, &SilentProgress).await;
        assert!(matches!(result, Err(ReqGraphError::Io { .. })));

        let _ = std::fs::remove_file(&blocker);
    }
}
