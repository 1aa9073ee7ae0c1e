//! JSON document store for pipeline outputs.
//!
//! The [`JsonStore`] writes each named document to `<data_dir>/<name>.json`
//! with 4-space indentation and reads it back. Every failure here is an I/O
//! boundary failure and is returned to the caller.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use reqgraph_shared::{ReqGraphError, Result};

/// Indentation used for every persisted document.
const INDENT: &[u8] = b"    ";

/// Directory of named JSON documents.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Serialize `value` and write it as `<name>.json`, replacing any previous
    /// document. Returns the written path.
    pub fn persist<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        validate_name(name)?;
        std::fs::create_dir_all(&self.root).map_err(|e| ReqGraphError::io(&self.root, e))?;

        let content = to_document_string(value)?;

        let path = self.path_for(name);
        std::fs::write(&path, content).map_err(|e| ReqGraphError::io(&path, e))?;

        tracing::info!(?path, "persisted document");
        Ok(path)
    }

    /// Read `<name>.json` into `T`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        validate_name(name)?;
        let path = self.path_for(name);
        let content = std::fs::read_to_string(&path).map_err(|e| ReqGraphError::io(&path, e))?;

        serde_json::from_str(&content).map_err(|e| {
            ReqGraphError::Serialization(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Read `<name>.json` as an untyped JSON value.
    pub fn load_value(&self, name: &str) -> Result<Value> {
        self.load(name)
    }
}

/// Serialize `value` in the persisted document layout (4-space indentation).
pub fn to_document_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser)?;

    String::from_utf8(buf).map_err(|e| ReqGraphError::Serialization(e.to_string()))
}

/// Document names become file names; they must not escape the data directory.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ReqGraphError::validation("document name is empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ReqGraphError::validation(format!(
            "document name {name:?} must not contain path separators"
        )));
    }
    Ok(())
}
