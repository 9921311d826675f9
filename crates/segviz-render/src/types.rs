//! Shared types for the segviz rendering pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// categorical rasters without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference
/// rendered rasters without depending on `image` directly.
pub use image::RgbImage;

/// A 2D grid of class indices, one `u8` per pixel.
///
/// Pixel values are class identifiers, not intensities. Loaded from a
/// single-channel raster and never mutated in place.
pub type CategoricalImage = GrayImage;

/// A 2D grid of RGB triples produced by [`colorize`](crate::colorize).
///
/// Always has the same dimensions as the categorical image it was
/// rendered from.
pub type RenderedImage = RgbImage;

/// Transport-safe text form of an image file: standard base64 with
/// padding.
///
/// This is the only image representation that crosses process or
/// network boundaries. It serializes as a bare JSON string. An empty
/// value stands for "no image" (e.g. an unavailable prediction).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wrap an already-encoded base64 string.
    ///
    /// No validation is performed; decoding happens on use.
    #[must_use]
    pub const fn new(text: String) -> Self {
        Self(text)
    }

    /// The empty placeholder used when an image is unavailable.
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Returns `true` if this holds no image data.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the base64 text in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Borrow the base64 text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the base64 text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncodedImage {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl AsRef<str> for EncodedImage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur while decoding, colorizing, or encoding images.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Input bytes (or text) were empty, or the raster has no pixels.
    #[error("input image data is empty")]
    EmptyInput,

    /// The bytes are not a raster the `image` crate can decode.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// PNG serialization of a rendered image failed.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// The transport text is not valid standard base64.
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Every pixel carries the same class index, so per-image
    /// normalization has no range to spread over.
    #[error("degenerate categorical image: every pixel has class index {class_index}")]
    DegenerateImage {
        /// The single class index present in the image.
        class_index: u8,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_encoded_image() {
        let e = EncodedImage::empty();
        assert!(e.is_empty());
        assert_eq!(e.len(), 0);
        assert_eq!(e, EncodedImage::default());
    }

    #[test]
    fn encoded_image_serializes_as_bare_string() {
        let e = EncodedImage::new("aGVsbG8=".to_string());
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, "\"aGVsbG8=\"");

        let back: EncodedImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "aGVsbG8=");
    }

    #[test]
    fn error_empty_input_display() {
        let err = RenderError::EmptyInput;
        assert_eq!(err.to_string(), "input image data is empty");
    }

    #[test]
    fn error_degenerate_display_names_index() {
        let err = RenderError::DegenerateImage { class_index: 7 };
        assert!(err.to_string().contains("class index 7"));
    }
}
