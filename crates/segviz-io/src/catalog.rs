//! Dataset catalog: the JSON index of selectable image identifiers.
//!
//! The catalog is produced by whoever prepared the dataset and is
//! served to clients as-is. Its structure is not interpreted here
//! beyond requiring valid JSON.

use std::path::{Path, PathBuf};

/// Errors from reading the catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("cannot read catalog {}: {source}", path.display())]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON.
    #[error("catalog {} is not valid JSON: {source}", path.display())]
    Json {
        /// Path that was read.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Read and parse the catalog at `path`.
///
/// The file is re-read on every call so edits are picked up without a
/// restart.
///
/// # Errors
///
/// Returns [`CatalogError::Io`] if the file cannot be read.
/// Returns [`CatalogError::Json`] if it is not valid JSON.
pub fn load_catalog(path: &Path) -> Result<serde_json::Value, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}
