//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dataset::DatasetLayout;
use crate::predictor::HttpPredictor;

/// What to do when an optional view cannot be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the view empty and still answer the request.
    #[default]
    Degrade,
    /// Fail the whole request.
    Fail,
}

/// Errors from validating a [`ServiceConfig`].
#[derive(Debug, thiserror::Error)]
#[error("invalid service configuration: {0}")]
pub struct ConfigError(pub String);

/// Configuration for the composition service.
///
/// Fields are public and unvalidated; call [`validate`](Self::validate)
/// before building a service from values that came from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory containing `*_leftImg8bit.*` and `*_gtFine_labelIds.*`
    /// files.
    pub images_dir: PathBuf,

    /// Image file extension, without the leading dot.
    pub extension: String,

    /// JSON catalog of available identifiers.
    pub catalog_path: PathBuf,

    /// Predictor endpoint. `None` disables prediction entirely.
    pub predictor_url: Option<String>,

    /// Timeout for one predictor round-trip, in seconds.
    pub predictor_timeout_secs: f64,

    /// Handling of a missing or unreadable raw camera frame.
    pub raw_image_policy: FailurePolicy,

    /// Handling of an unavailable or unprocessable prediction.
    pub prediction_policy: FailurePolicy,
}

impl ServiceConfig {
    pub const DEFAULT_IMAGES_DIR: &str = "static/images";
    pub const DEFAULT_EXTENSION: &str = "png";
    pub const DEFAULT_CATALOG_PATH: &str = "static/images.json";
    pub const DEFAULT_PREDICTOR_TIMEOUT_SECS: f64 = 30.0;

    /// File layout derived from `images_dir` and `extension`.
    #[must_use]
    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(self.images_dir.clone(), self.extension.clone())
    }

    /// Predictor timeout as a [`Duration`].
    ///
    /// Falls back to the default for values [`validate`](Self::validate)
    /// would reject.
    #[must_use]
    pub fn predictor_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.predictor_timeout_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(HttpPredictor::DEFAULT_TIMEOUT)
    }

    /// Check the invariants the service relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(ConfigError(format!(
                "extension must be non-empty and without a leading dot, got {:?}",
                self.extension
            )));
        }
        if !(self.predictor_timeout_secs.is_finite() && self.predictor_timeout_secs > 0.0) {
            return Err(ConfigError(format!(
                "predictor_timeout_secs must be positive, got {}",
                self.predictor_timeout_secs
            )));
        }
        if self.predictor_url.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError(
                "predictor_url must not be empty; omit it to disable prediction".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(Self::DEFAULT_IMAGES_DIR),
            extension: Self::DEFAULT_EXTENSION.to_string(),
            catalog_path: PathBuf::from(Self::DEFAULT_CATALOG_PATH),
            predictor_url: Some(HttpPredictor::DEFAULT_ENDPOINT.to_string()),
            predictor_timeout_secs: Self::DEFAULT_PREDICTOR_TIMEOUT_SECS,
            raw_image_policy: FailurePolicy::Degrade,
            prediction_policy: FailurePolicy::Degrade,
        }
    }
}
