//! Conversion of database records into artifacts and trace links.
//!
//! Normalization runs in two passes over the record list:
//! 1. every record passing the filter allow-list becomes an [`Artifact`] and
//!    registers `record id → artifact name` in the [`ResolutionMap`];
//! 2. if a parents field is configured, every record (filtered or not) yields
//!    one [`TraceLink`] per parent id found in the map.

pub mod fields;

use std::collections::HashMap;

use tracing::{error, info, instrument};

use reqgraph_notion::{Record, RecordSource};
use reqgraph_shared::{Artifact, ProgressReporter, TableConfig, TraceLink};

pub use fields::{FieldKind, FieldReader, FieldValue};

/// Record id → artifact name, complete before any trace is resolved.
pub type ResolutionMap = HashMap<String, String>;

/// Output of a normalization run.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub artifacts: Vec<Artifact>,
    pub traces: Vec<TraceLink>,
}

pub struct TableNormalizer<'a, S: ?Sized> {
    reader: FieldReader<'a, S>,
    config: &'a TableConfig,
}

impl<'a, S: RecordSource + ?Sized> TableNormalizer<'a, S> {
    pub fn new(source: &'a S, config: &'a TableConfig) -> Self {
        Self {
            reader: FieldReader::new(source, config),
            config,
        }
    }

    /// Run both passes over `records`.
    pub async fn normalize(
        &self,
        records: &[Record],
        progress: &dyn ProgressReporter,
    ) -> NormalizedTable {
        progress.phase("Building artifacts");
        let (artifacts, resolution) = self.build_artifacts(records, progress).await;

        let traces = if self.config.parents_field.is_empty() {
            Vec::new()
        } else {
            progress.phase("Resolving parents");
            self.build_traces(records, &resolution)
        };

        NormalizedTable { artifacts, traces }
    }

    /// Pass 1: artifacts for records passing the allow-list, plus the
    /// resolution map.
    pub async fn build_artifacts(
        &self,
        records: &[Record],
        progress: &dyn ProgressReporter,
    ) -> (Vec<Artifact>, ResolutionMap) {
        let mut artifacts = Vec::new();
        let mut resolution = ResolutionMap::new();

        for (i, record) in records.iter().enumerate() {
            let filter = self.reader.filter_value(record);
            if !self.config.accepts(&filter) {
                continue;
            }

            let artifact = self.record_to_artifact(record).await;
            info!(record_id = %record.id, name = %artifact.name, "added artifact");
            progress.item(&artifact.name, i + 1, records.len());

            resolution.insert(record.id.clone(), artifact.name.clone());
            artifacts.push(artifact);
        }

        (artifacts, resolution)
    }

    /// Pass 2: trace links from every record to its resolvable parents.
    pub fn build_traces(&self, records: &[Record], resolution: &ResolutionMap) -> Vec<TraceLink> {
        let mut traces = Vec::new();

        for record in records {
            let name = self.reader.name(record);
            let links = parent_trace_links(&name, &self.reader.parents(record), resolution);

            if !links.is_empty() {
                info!(name = %name, count = links.len(), "added traces");
            }
            traces.extend(links);
        }

        traces
    }

    async fn record_to_artifact(&self, record: &Record) -> Artifact {
        let name = self.reader.name(record);
        let body = self.reader.read(record, FieldKind::Body).await.into_text();
        let mut artifact_type = self.reader.type_label(record);
        if artifact_type.is_empty() {
            artifact_type = self.config.artifact_type.clone();
        }

        Artifact::new(name, body, artifact_type)
    }
}

/// One manual trace link per parent id present in `resolution`; the rest are
/// dropped.
pub fn parent_trace_links(
    source_name: &str,
    parent_ids: &[String],
    resolution: &ResolutionMap,
) -> Vec<TraceLink> {
    parent_ids
        .iter()
        .filter_map(|id| resolution.get(id))
        .map(|target| TraceLink::manual(source_name, target.as_str()))
        .collect()
}

/// Query the configured collection and normalize it.
///
/// A failed query is logged and normalizes as an empty collection.
#[instrument(skip_all, fields(table_id = %config.table_id))]
pub async fn normalize_table<S>(
    source: &S,
    config: &TableConfig,
    progress: &dyn ProgressReporter,
) -> NormalizedTable
where
    S: RecordSource + ?Sized,
{
    progress.phase("Downloading records");
    let records = match source.query_all(&config.table_id).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "failed to query database");
            progress.failed(&config.table_id, &e.to_string());
            Vec::new()
        }
    };

    info!(records = records.len(), "downloaded records");
    TableNormalizer::new(source, config)
        .normalize(&records, progress)
        .await
}
