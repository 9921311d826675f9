//! Composition service: one identifier in, three encoded views out.
//!
//! # Request flow
//!
//! ```text
//! Start -> ValidateId -> LoadRaw -> LoadAndColorizeGT -> CallPredictor
//!       -> ColorizePrediction (optional) -> Done
//! ```
//!
//! Only `ValidateId` and `LoadAndColorizeGT` always end the request on
//! failure. `LoadRaw` and the prediction stages degrade to an empty view
//! unless their [`FailurePolicy`] is [`FailurePolicy::Fail`].
//!
//! A [`Composer`] holds no mutable state and can be shared across
//! threads; every call to [`Composer::compose`] is independent.

use std::path::Path;

use log::{debug, warn};
use segviz_render::{EncodedImage, RenderError, TAB10, TAB20};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, FailurePolicy, ServiceConfig};
use crate::dataset::{self, DatasetError, DatasetLayout};
use crate::predictor::{HttpPredictor, OfflinePredictor, PredictionUnavailable, Predictor};

/// The three aligned views of one dataset sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResult {
    /// Raw camera frame, file bytes verbatim.
    pub image1: EncodedImage,
    /// Ground-truth label map, colorized with [`TAB20`].
    pub image2: EncodedImage,
    /// Predicted label map, colorized with [`TAB10`]; empty when no
    /// prediction was available.
    pub image3: EncodedImage,
}

/// Errors that end a composition request.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// The identifier was empty.
    #[error("no image selected")]
    MissingSelection,

    /// The raw frame could not be read (only with [`FailurePolicy::Fail`]).
    #[error("raw image unavailable: {0}")]
    RawImage(#[source] DatasetError),

    /// The ground-truth label map could not be loaded, colorized, or
    /// encoded.
    #[error("ground-truth processing failed: {0}")]
    LabelProcessing(#[source] DatasetError),

    /// The predictor produced nothing usable (only with
    /// [`FailurePolicy::Fail`]).
    #[error("prediction unavailable: {0}")]
    Prediction(#[source] PredictionUnavailable),

    /// The predictor's image could not be decoded or colorized (only
    /// with [`FailurePolicy::Fail`]).
    #[error("predicted image processing failed: {0}")]
    PredictionProcessing(#[source] RenderError),
}

impl ComposeError {
    /// Whether the failure was caused by the caller's request rather
    /// than by the server or its collaborators.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingSelection)
    }

    /// Short message safe to show to clients: no paths, no causes.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::MissingSelection => "No image selected",
            Self::RawImage(_) => "Failed to load image 1",
            Self::LabelProcessing(_) => "Failed to process image 2",
            Self::Prediction(_) => "Failed to fetch predicted image",
            Self::PredictionProcessing(_) => "Failed to process predicted image",
        }
    }
}

/// Assembles [`CompositeResult`]s from the dataset and a [`Predictor`].
pub struct Composer {
    layout: DatasetLayout,
    predictor: Box<dyn Predictor>,
    raw_image_policy: FailurePolicy,
    prediction_policy: FailurePolicy,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("layout", &self.layout)
            .field("raw_image_policy", &self.raw_image_policy)
            .field("prediction_policy", &self.prediction_policy)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Create a composer with both failure policies set to
    /// [`FailurePolicy::Degrade`].
    pub fn new(layout: DatasetLayout, predictor: impl Predictor + 'static) -> Self {
        Self {
            layout,
            predictor: Box::new(predictor),
            raw_image_policy: FailurePolicy::Degrade,
            prediction_policy: FailurePolicy::Degrade,
        }
    }

    /// Build a composer from a validated configuration.
    ///
    /// Uses an [`HttpPredictor`] when `predictor_url` is set and an
    /// [`OfflinePredictor`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = config.layout();
        let composer = match &config.predictor_url {
            Some(url) => Self::new(layout, HttpPredictor::new(url, config.predictor_timeout())),
            None => Self::new(layout, OfflinePredictor),
        };
        Ok(composer
            .with_raw_image_policy(config.raw_image_policy)
            .with_prediction_policy(config.prediction_policy))
    }

    /// Set how a missing raw frame is handled.
    #[must_use]
    pub const fn with_raw_image_policy(mut self, policy: FailurePolicy) -> Self {
        self.raw_image_policy = policy;
        self
    }

    /// Set how an unavailable or unprocessable prediction is handled.
    #[must_use]
    pub const fn with_prediction_policy(mut self, policy: FailurePolicy) -> Self {
        self.prediction_policy = policy;
        self
    }

    /// The file layout this composer reads from.
    #[must_use]
    pub const fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Assemble the raw, ground-truth, and predicted views for
    /// `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingSelection`] for an empty identifier,
    /// before touching the filesystem or network.
    /// Returns [`ComposeError::LabelProcessing`] if the ground truth
    /// cannot be produced.
    /// Returns [`ComposeError::RawImage`], [`ComposeError::Prediction`],
    /// or [`ComposeError::PredictionProcessing`] only when the matching
    /// policy is [`FailurePolicy::Fail`].
    pub fn compose(&self, identifier: &str) -> Result<CompositeResult, ComposeError> {
        if identifier.is_empty() {
            return Err(ComposeError::MissingSelection);
        }

        let image1 = self.load_raw(&self.layout.raw_path(identifier))?;
        let image2 = load_ground_truth(&self.layout.label_path(identifier))
            .map_err(ComposeError::LabelProcessing)?;
        let image3 = self.predict(identifier, &image1)?;

        debug!(
            "composed {identifier}: raw {} B, ground truth {} B, prediction {} B",
            image1.len(),
            image2.len(),
            image3.len()
        );
        Ok(CompositeResult {
            image1,
            image2,
            image3,
        })
    }

    fn load_raw(&self, path: &Path) -> Result<EncodedImage, ComposeError> {
        match dataset::load_raw_bytes_as_text(path) {
            Ok(encoded) => Ok(encoded),
            Err(err) => match self.raw_image_policy {
                FailurePolicy::Degrade => {
                    warn!("raw image unavailable, leaving image1 empty: {err}");
                    Ok(EncodedImage::empty())
                }
                FailurePolicy::Fail => Err(ComposeError::RawImage(err)),
            },
        }
    }

    fn predict(&self, identifier: &str, raw: &EncodedImage) -> Result<EncodedImage, ComposeError> {
        // Without a raw frame there is nothing to send.
        if raw.is_empty() {
            debug!("no raw image for {identifier}, skipping prediction");
            return Ok(EncodedImage::empty());
        }

        let outcome = self
            .predictor
            .predict(raw)
            .map_err(ComposeError::Prediction)
            .and_then(|predicted| {
                segviz_render::recolor_text(predicted.as_str(), &TAB10)
                    .map_err(ComposeError::PredictionProcessing)
            });

        match (outcome, self.prediction_policy) {
            (Ok(encoded), _) => Ok(encoded),
            (Err(err), FailurePolicy::Degrade) => {
                warn!("prediction for {identifier} degraded to empty: {err}");
                Ok(EncodedImage::empty())
            }
            (Err(err), FailurePolicy::Fail) => Err(err),
        }
    }
}

/// Load the ground-truth label map, colorize it with [`TAB20`], and
/// encode it.
fn load_ground_truth(path: &Path) -> Result<EncodedImage, DatasetError> {
    let labels = dataset::load_grayscale(path)?;
    Ok(segviz_render::render_categorical(&labels, &TAB20)?)
}
