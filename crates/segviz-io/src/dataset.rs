//! File-backed image loading for the Cityscapes-style dataset layout.
//!
//! Every identifier (e.g. `frankfurt_000000_000294`) names two files in
//! one images directory:
//!
//! ```text
//! {images_dir}/{id}_leftImg8bit.{ext}       raw camera frame
//! {images_dir}/{id}_gtFine_labelIds.{ext}   ground-truth class indices
//! ```

use std::path::{Path, PathBuf};

use segviz_render::{CategoricalImage, EncodedImage, RenderError};
use serde::{Deserialize, Serialize};

/// Filename suffix of raw camera frames.
pub const RAW_SUFFIX: &str = "_leftImg8bit";

/// Filename suffix of ground-truth label maps.
pub const LABEL_SUFFIX: &str = "_gtFine_labelIds";

/// Errors from reading dataset files.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The file is missing or could not be read.
    #[error("cannot read {}: {source}", path.display())]
    NotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its content could not be decoded or
    /// rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Where the dataset's images live and how their files are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Directory holding both raw frames and label maps.
    pub images_dir: PathBuf,
    /// File extension without the leading dot (e.g. `"png"`).
    pub extension: String,
}

impl DatasetLayout {
    /// Create a layout for `images_dir` with files ending in `.{extension}`.
    #[must_use]
    pub fn new(images_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            images_dir: images_dir.into(),
            extension: extension.into(),
        }
    }

    /// Path of the raw camera frame for `identifier`.
    #[must_use]
    pub fn raw_path(&self, identifier: &str) -> PathBuf {
        self.path_with_suffix(identifier, RAW_SUFFIX)
    }

    /// Path of the ground-truth label map for `identifier`.
    #[must_use]
    pub fn label_path(&self, identifier: &str) -> PathBuf {
        self.path_with_suffix(identifier, LABEL_SUFFIX)
    }

    fn path_with_suffix(&self, identifier: &str, suffix: &str) -> PathBuf {
        self.images_dir
            .join(format!("{identifier}{suffix}.{}", self.extension))
    }
}

fn read(path: &Path) -> Result<Vec<u8>, DatasetError> {
    std::fs::read(path).map_err(|source| DatasetError::NotFound {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a single-channel categorical image from `path`.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] if the file is missing or unreadable.
/// Returns [`DatasetError::Render`] if the bytes are not a valid raster.
pub fn load_grayscale(path: &Path) -> Result<CategoricalImage, DatasetError> {
    let bytes = read(path)?;
    Ok(segviz_render::decode_and_grayscale(&bytes)?)
}

/// Read a file verbatim and base64-encode it, without decoding pixels.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] if the file is missing or unreadable.
pub fn load_raw_bytes_as_text(path: &Path) -> Result<EncodedImage, DatasetError> {
    let bytes = read(path)?;
    Ok(segviz_render::encode_bytes(&bytes))
}
