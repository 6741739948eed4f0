//! Repository configuration via `strata-index.toml`
//!
//! Every setting has a default, so a missing file or an empty file yields
//! the default configuration. Unknown keys are rejected so that a typo does
//! not silently fall back to a default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_core::{Error, Result};

/// Config file name conventionally placed next to the database.
pub const CONFIG_FILE_NAME: &str = "strata-index.toml";

/// Index maintenance policy for an [`IndexedRepository`](crate::IndexedRepository).
///
/// # Example
///
/// ```toml
/// # Remove a record's key from index values it no longer holds on put
/// replace_stale_index_entries = true
///
/// # Delete index entries whose key set became empty
/// prune_empty_key_sets = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// When true, `put` reads the previous record under the same key and
    /// removes its primary key from every index value that changed. When
    /// false, callers changing an indexed field must delete then put.
    #[serde(default = "default_true")]
    pub replace_stale_index_entries: bool,
    /// When true, an index entry whose key set becomes empty is deleted
    /// instead of being rewritten as an empty set.
    #[serde(default = "default_true")]
    pub prune_empty_key_sets: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            replace_stale_index_entries: true,
            prune_empty_key_sets: true,
        }
    }
}

impl RepositoryConfig {
    /// Index entries are only ever added by `put`, and emptied key sets
    /// are kept.
    pub fn append_only() -> Self {
        Self {
            replace_stale_index_entries: false,
            prune_empty_key_sets: false,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Strata index configuration
#
# Remove a record's primary key from index values it no longer holds when
# the record is overwritten by put (default: true). When false, callers
# that change an indexed field must delete the record before putting it.
replace_stale_index_entries = true

# Delete index entries whose key set became empty (default: true).
# When false, an empty key set is written back instead.
prune_empty_key_sets = true
"#
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on invalid TOML, wrong value types or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("Failed to parse config file '{}': {}", path.display(), e))
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
