//! Editor configuration.
//!
//! ```toml
//! case_insensitive_bubbling = false
//! strict_linking = true
//! max_validation_retries = 5
//!
//! [namespaces]
//! ed = "urn:example:edition"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tei_xpath::NamespaceTable;
use tei_xpath::namespaces::is_reserved_prefix;

use crate::error::{EditorError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Prefixes added to the `tei`/`xml` table used for every XPath query
    pub namespaces: BTreeMap<String, String>,
    /// Compare tag names ASCII-case-insensitively when bubbling a selection
    pub case_insensitive_bubbling: bool,
    /// Attempts [`crate::ValidationDriver`] makes before giving up on a
    /// document that keeps changing under the validator
    pub max_validation_retries: u32,
    /// Treat partially linked documents as unlinked
    pub strict_linking: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            namespaces: BTreeMap::new(),
            case_insensitive_bubbling: false,
            max_validation_retries: 3,
            strict_linking: false,
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EditorConfig = toml::from_str(content).map_err(|e| EditorError::Config(e.to_string()))?;
        if let Some(prefix) = config.namespaces.keys().find(|p| is_reserved_prefix(p)) {
            return Err(EditorError::Config(format!("prefix `{}` is reserved and cannot be rebound", prefix)));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded editor configuration");
        Ok(config)
    }

    /// The fixed `tei`/`xml` bindings extended with [`EditorConfig::namespaces`].
    pub fn namespace_table(&self) -> NamespaceTable {
        let mut table = NamespaceTable::default();
        for (prefix, uri) in &self.namespaces {
            table.bind(prefix.as_str(), uri.as_str());
        }
        table
    }
}
