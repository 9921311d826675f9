//! In-memory image codec: raster bytes, PNG, and base64 transport text.
//!
//! Converts between:
//!
//! - raw image file bytes and a [`CategoricalImage`] (decode + luma),
//! - a [`RenderedImage`] and PNG-then-base64 [`EncodedImage`] text,
//! - base64 text and a [`CategoricalImage`].
//!
//! Nothing here touches the filesystem; the file-backed operations live
//! in `segviz-io` and delegate to these functions.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageEncoder, Luma};

use crate::types::{CategoricalImage, EncodedImage, RenderError, RenderedImage};

/// Decode raw image bytes into a single-channel categorical image.
///
/// Supports PNG, JPEG, BMP, and WebP (whatever the `image` crate can
/// decode). Single-channel 8-bit rasters pass through unchanged.
/// 16-bit single-channel samples are clipped to 255, so class indices
/// stored in wide label maps keep their values. RGB and RGBA rasters use
/// the ITU-R 601 luma weights (299/587/114), ignoring alpha; anything
/// else goes through `image`'s own 8-bit luma conversion.
///
/// # Errors
///
/// Returns [`RenderError::EmptyInput`] if `bytes` is empty.
/// Returns [`RenderError::Decode`] if the image format is unrecognized
/// or the data is corrupt.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<CategoricalImage, RenderError> {
    if bytes.is_empty() {
        return Err(RenderError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(match img {
        DynamicImage::ImageLuma8(gray) => gray,
        DynamicImage::ImageLuma16(wide) => CategoricalImage::from_fn(
            wide.width(),
            wide.height(),
            |x, y| Luma([u8::try_from(wide.get_pixel(x, y).0[0]).unwrap_or(u8::MAX)]),
        ),
        DynamicImage::ImageRgb8(rgb) => CategoricalImage::from_fn(
            rgb.width(),
            rgb.height(),
            |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([luma_601(r, g, b)])
            },
        ),
        DynamicImage::ImageRgba8(rgba) => CategoricalImage::from_fn(
            rgba.width(),
            rgba.height(),
            |x, y| {
                let [r, g, b, _] = rgba.get_pixel(x, y).0;
                Luma([luma_601(r, g, b)])
            },
        ),
        other => other.into_luma8(),
    })
}

/// 8-bit luma with 16.16 fixed-point ITU-R 601 weights, rounded.
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
    u8::try_from(l).unwrap_or(u8::MAX)
}

/// Base64-encode file bytes verbatim, with no pixel reinterpretation.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> EncodedImage {
    EncodedImage::new(STANDARD.encode(bytes))
}

/// Decode base64 transport text back into the original bytes.
///
/// # Errors
///
/// Returns [`RenderError::EmptyInput`] if `text` is empty.
/// Returns [`RenderError::Base64`] if `text` is not valid standard
/// base64.
pub fn decode_text(text: &str) -> Result<Vec<u8>, RenderError> {
    if text.is_empty() {
        return Err(RenderError::EmptyInput);
    }
    Ok(STANDARD.decode(text)?)
}

/// Serialize a rendered image to PNG bytes (RGB8, lossless).
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if PNG encoding fails.
pub fn encode_png(image: &RenderedImage) -> Result<Vec<u8>, RenderError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(RenderError::Encode)?;
    Ok(png_bytes)
}

/// Encode a rendered image as PNG, then as base64 transport text.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if PNG encoding fails.
pub fn encode_rendered(image: &RenderedImage) -> Result<EncodedImage, RenderError> {
    let png_bytes = encode_png(image)?;
    Ok(encode_bytes(&png_bytes))
}

/// Decode base64 transport text into a categorical image.
///
/// This is the in-memory counterpart of loading a grayscale file; it is
/// used for the predictor's response.
///
/// # Errors
///
/// Returns [`RenderError::EmptyInput`] if `text` is empty.
/// Returns [`RenderError::Base64`] if `text` is not valid base64.
/// Returns [`RenderError::Decode`] if the decoded bytes are not a
/// raster.
pub fn decode_text_to_grayscale(text: &str) -> Result<CategoricalImage, RenderError> {
    let bytes = decode_text(text)?;
    decode_and_grayscale(&bytes)
}
