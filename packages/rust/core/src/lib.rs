//! Pipeline orchestration for reqgraph.
//!
//! This crate ties together the site crawler, the table normalizer, and the
//! JSON store into the two end-to-end workflows invoked by the CLI.

pub mod pipeline;

pub use pipeline::{
    SiteCrawlReport, TableExportReport, artifact_document_name, crawl_site, export_table,
    trace_document_name,
};
