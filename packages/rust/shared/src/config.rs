//! Application configuration for reqgraph.
//!
//! User config lives at `~/.reqgraph/reqgraph.toml`.
//! Notion bindings come from the environment; CLI flags override both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReqGraphError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reqgraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reqgraph";

/// Environment variables recognized by [`TableConfig::from_env`].
pub const ENV_TABLE_ID: &str = "NOTION_TABLE_ID";
pub const ENV_FIELD_TYPE: &str = "NOTION_FIELD_ID_TYPE";
pub const ENV_FIELD_PARENTS: &str = "NOTION_FIELD_ID_PARENTS";
pub const ENV_FIELD_FILTER: &str = "NOTION_FIELD_ID_FILTER";
pub const ENV_FILTER_VALUES: &str = "NOTION_FIELD_VALUE_FILTER";

// ---------------------------------------------------------------------------
// Config structs (matching reqgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Documentation site crawl settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Notion workspace settings.
    #[serde(default)]
    pub notion: NotionConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory where persisted JSON documents are written.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".into()
}

/// `[site]` section: where the crawler starts and what it keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Navigation index page listing the top-level programs.
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Prefix joined in front of every matching navigation href.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Only navigation hrefs starting with this path become seeds.
    #[serde(default = "default_program_path_prefix")]
    pub program_path_prefix: String,

    /// Name of the persisted raw pages document.
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            url_prefix: default_url_prefix(),
            program_path_prefix: default_program_path_prefix(),
            output_name: default_output_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_url_prefix() -> String {
    "https://www.opencaesar.io/firesat-example/".into()
}
fn default_index_url() -> String {
    format!("{}navigation.html", default_url_prefix())
}
fn default_program_path_prefix() -> String {
    "opencaesar.io/examples/firesat/programs/".into()
}
fn default_output_name() -> String {
    "firesat_raw".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[notion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Name of the env var holding the integration token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Artifact type used when a record declares none; also names the output files.
    #[serde(default = "default_artifact_type")]
    pub artifact_type: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            api_base: default_api_base(),
            artifact_type: default_artifact_type(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_token_env() -> String {
    "NOTION_TOKEN".into()
}
fn default_api_base() -> String {
    "https://api.notion.com/v1".into()
}
fn default_artifact_type() -> String {
    "Notion Requirement".into()
}

// ---------------------------------------------------------------------------
// Table config (runtime, merged from environment + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration of the table normalizer.
///
/// Built once at startup and passed by reference into the pipeline.
#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    /// Integration token for the workspace API.
    pub token: String,
    /// Database (collection) id to read.
    pub table_id: String,
    /// Property key of the single-select "type" field.
    pub type_field: String,
    /// Property key of the relation "parents" field. Empty disables traces.
    pub parents_field: String,
    /// Property key of the single-select "filter" field.
    pub filter_field: String,
    /// Accepted filter values. Empty accepts every record.
    pub filter_values: Vec<String>,
    /// Fallback artifact type label.
    pub artifact_type: String,
}

impl TableConfig {
    /// Read the table bindings from the process environment.
    pub fn from_env(app: &AppConfig) -> Self {
        Self::from_lookup(app, |key| std::env::var(key).ok())
    }

    /// Read the table bindings through an arbitrary lookup (env, map, ...).
    pub fn from_lookup(app: &AppConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).unwrap_or_default();

        Self {
            token: get(&app.notion.token_env),
            table_id: get(ENV_TABLE_ID),
            type_field: get(ENV_FIELD_TYPE),
            parents_field: get(ENV_FIELD_PARENTS),
            filter_field: get(ENV_FIELD_FILTER),
            filter_values: parse_filter_values(&get(ENV_FILTER_VALUES)),
            artifact_type: app.notion.artifact_type.clone(),
        }
    }

    /// Ensure the bindings needed to query the database are present.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(ReqGraphError::config(
                "Notion token not found. Set NOTION_TOKEN or pass --token.",
            ));
        }
        if self.table_id.is_empty() {
            return Err(ReqGraphError::config(format!(
                "Notion table id not found. Set {ENV_TABLE_ID} or pass --table-id."
            )));
        }
        Ok(())
    }

    /// Whether the record passes the allow-list.
    pub fn accepts(&self, filter_value: &str) -> bool {
        self.filter_values.is_empty() || self.filter_values.iter().any(|v| v == filter_value)
    }
}

/// Split a comma-separated allow-list. Blank entries are dropped, so an empty
/// string yields an empty (accept-all) list.
pub fn parse_filter_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reqgraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReqGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reqgraph/reqgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReqGraphError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ReqGraphError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReqGraphError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReqGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReqGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
