//! Shared types, error model, and configuration for reqgraph.
//!
//! This crate is the foundation depended on by all other reqgraph crates.
//! It provides:
//! - [`ReqGraphError`] — the unified error type
//! - Schema types ([`Artifact`], [`TraceLink`], [`PageContent`], [`Row`], [`RawPages`])
//! - Configuration ([`AppConfig`], [`SiteConfig`], [`TableConfig`], config loading)
//! - Progress reporting ([`ProgressReporter`])

pub mod config;
pub mod error;
pub mod progress;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, NotionConfig, SiteConfig, TableConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, parse_filter_values,
};
pub use error::{ReqGraphError, Result};
pub use progress::{ProgressReporter, SilentProgress};
pub use types::{
    ARTIFACT_TREE, ApprovalStatus, Artifact, ArtifactDocument, PageContent, RawPages, Row,
    TraceDocument, TraceLink, TraceType,
};
