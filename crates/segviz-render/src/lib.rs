//! segviz-render: label-map colorization and image transport codec (sans-IO).
//!
//! Turns categorical class-index rasters into displayable RGB images
//! and moves images in and out of their base64 transport form:
//!
//! bytes/base64 -> categorical image -> colorize -> PNG -> base64
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and strings. All filesystem and network interaction
//! lives in `segviz-io`.

pub mod codec;
pub mod palette;
pub mod types;

pub use codec::{
    decode_and_grayscale, decode_text, decode_text_to_grayscale, encode_bytes, encode_png,
    encode_rendered,
};
pub use palette::{ColorTable, TAB10, TAB20, colorize};
pub use types::{
    CategoricalImage, EncodedImage, GrayImage, RenderError, RenderedImage, RgbImage,
};

/// Colorize a categorical image with `table` and encode the result for
/// transport.
///
/// # Pipeline steps
///
/// 1. Per-image normalization and palette lookup ([`colorize`])
/// 2. PNG serialization and base64 encoding ([`encode_rendered`])
///
/// # Errors
///
/// Returns [`RenderError::EmptyInput`] if the image has no pixels.
/// Returns [`RenderError::DegenerateImage`] if the image has a single
/// class index.
/// Returns [`RenderError::Encode`] if PNG encoding fails.
pub fn render_categorical(
    image: &CategoricalImage,
    table: &ColorTable,
) -> Result<EncodedImage, RenderError> {
    let rendered = colorize(image, table)?;
    encode_rendered(&rendered)
}

/// Decode a base64 categorical image, colorize it with `table`, and
/// re-encode it.
///
/// # Errors
///
/// Any error from [`decode_text_to_grayscale`] or
/// [`render_categorical`].
pub fn recolor_text(text: &str, table: &ColorTable) -> Result<EncodedImage, RenderError> {
    let categorical = decode_text_to_grayscale(text)?;
    render_categorical(&categorical, table)
}
