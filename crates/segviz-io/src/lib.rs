//! segviz-io: dataset files, predictor client, and the composition service.
//!
//! Everything in segviz that touches the filesystem or the network lives
//! here; pixel work is delegated to the sans-IO `segviz-render` crate.

pub mod catalog;
pub mod compose;
pub mod config;
pub mod dataset;
pub mod predictor;

pub use catalog::{CatalogError, load_catalog};
pub use compose::{ComposeError, Composer, CompositeResult};
pub use config::{ConfigError, FailurePolicy, ServiceConfig};
pub use dataset::{DatasetError, DatasetLayout, load_grayscale, load_raw_bytes_as_text};
pub use predictor::{HttpPredictor, OfflinePredictor, PredictionUnavailable, Predictor};
