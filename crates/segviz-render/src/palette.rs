//! Categorical color tables and label-map colorization.
//!
//! A [`ColorTable`] is a fixed, ordered list of visually distinct RGB
//! colors. [`colorize`] maps every class index of a categorical image to
//! one of those colors.
//!
//! # Normalization
//!
//! Indices are normalized **per image**: each index is divided by the
//! largest index present in that image, and the resulting position in
//! `[0, 1]` selects a slot of the table the same way a continuous
//! colormap built from a listed palette is sampled:
//!
//! ```text
//! pos  = (index / max_index) * N      (pos == N is clamped to N - 1)
//! slot = trunc(pos)
//! ```
//!
//! As a consequence the same class index can render in different colors
//! in two images whose largest index differs. Consumers rely on this
//! mapping, so it must not be replaced by a fixed class-count scale.

use image::Rgb;

use crate::types::{CategoricalImage, RenderError, RenderedImage};

/// A named, ordered palette of distinct RGB colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTable {
    name: &'static str,
    colors: &'static [[u8; 3]],
}

/// The 10-color qualitative table (matplotlib `tab10`).
///
/// Used for predicted label maps.
pub const TAB10: ColorTable = ColorTable::new(
    "tab10",
    &[
        [0x1f, 0x77, 0xb4], // blue
        [0xff, 0x7f, 0x0e], // orange
        [0x2c, 0xa0, 0x2c], // green
        [0xd6, 0x27, 0x28], // red
        [0x94, 0x67, 0xbd], // purple
        [0x8c, 0x56, 0x4b], // brown
        [0xe3, 0x77, 0xc2], // pink
        [0x7f, 0x7f, 0x7f], // gray
        [0xbc, 0xbd, 0x22], // olive
        [0x17, 0xbe, 0xcf], // cyan
    ],
);

/// The 20-color qualitative table (matplotlib `tab20`): each `tab10`
/// hue followed by a lighter variant.
///
/// Used for ground-truth label maps.
pub const TAB20: ColorTable = ColorTable::new(
    "tab20",
    &[
        [0x1f, 0x77, 0xb4],
        [0xae, 0xc7, 0xe8],
        [0xff, 0x7f, 0x0e],
        [0xff, 0xbb, 0x78],
        [0x2c, 0xa0, 0x2c],
        [0x98, 0xdf, 0x8a],
        [0xd6, 0x27, 0x28],
        [0xff, 0x98, 0x96],
        [0x94, 0x67, 0xbd],
        [0xc5, 0xb0, 0xd5],
        [0x8c, 0x56, 0x4b],
        [0xc4, 0x9c, 0x94],
        [0xe3, 0x77, 0xc2],
        [0xf7, 0xb6, 0xd2],
        [0x7f, 0x7f, 0x7f],
        [0xc7, 0xc7, 0xc7],
        [0xbc, 0xbd, 0x22],
        [0xdb, 0xdb, 0x8d],
        [0x17, 0xbe, 0xcf],
        [0x9e, 0xda, 0xe5],
    ],
);

impl ColorTable {
    /// Create a table from a static list of colors.
    ///
    /// `colors` must not be empty.
    #[must_use]
    pub const fn new(name: &'static str, colors: &'static [[u8; 3]]) -> Self {
        Self { name, colors }
    }

    /// Human-readable table name (e.g. `"tab20"`).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of colors in the table.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns `true` if the table has no colors.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The table's colors as 8-bit RGB triples, in order.
    #[must_use]
    pub const fn colors(&self) -> &'static [[u8; 3]] {
        self.colors
    }

    /// Table slot for a normalized position in `[0, 1]`.
    ///
    /// Positions outside `[0, 1]` are clamped to the first or last slot.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    pub fn slot(&self, normalized: f64) -> usize {
        let n = self.colors.len();
        let n_f = n as f64;
        let mut pos = normalized * n_f;
        // The top of the range belongs to the last slot, not one past it.
        if pos == n_f {
            pos = n_f - 1.0;
        }
        if pos <= 0.0 {
            return 0;
        }
        (pos as usize).min(n.saturating_sub(1))
    }

    /// Color for a normalized position in `[0, 1]`.
    ///
    /// Each channel goes through the unit-float representation of the
    /// table and back, truncating: `trunc((byte / 255) * 255)`.
    #[must_use]
    pub fn sample(&self, normalized: f64) -> [u8; 3] {
        let [r, g, b] = self
            .colors
            .get(self.slot(normalized))
            .copied()
            .unwrap_or_default();
        [unit_to_byte(r), unit_to_byte(g), unit_to_byte(b)]
    }
}

/// Round-trip an 8-bit channel through `[0, 1]` and truncate back.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_byte(channel: u8) -> u8 {
    (f64::from(channel) / 255.0 * 255.0) as u8
}

/// Map every class index of `image` to a color from `table`.
///
/// Indices are normalized by the largest index present in this image
/// (see the [module docs](self)). The output has the same dimensions as
/// the input.
///
/// # Errors
///
/// Returns [`RenderError::EmptyInput`] if the image has no pixels.
/// Returns [`RenderError::DegenerateImage`] if every pixel carries the
/// same class index, which leaves nothing to normalize over (and for an
/// all-zero image would divide by zero).
pub fn colorize(
    image: &CategoricalImage,
    table: &ColorTable,
) -> Result<RenderedImage, RenderError> {
    let pixels = image.as_raw();
    let (Some(&min), Some(&max)) = (pixels.iter().min(), pixels.iter().max()) else {
        return Err(RenderError::EmptyInput);
    };
    if min == max {
        return Err(RenderError::DegenerateImage { class_index: max });
    }

    // One lookup entry per index value that can occur in this image.
    let lut: Vec<[u8; 3]> = (0..=max)
        .map(|index| table.sample(f64::from(index) / f64::from(max)))
        .collect();

    Ok(RenderedImage::from_fn(image.width(), image.height(), |x, y| {
        let index = usize::from(image.get_pixel(x, y).0[0]);
        Rgb(lut[index])
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Luma;

    use super::*;

    fn image_from_rows(rows: &[&[u8]]) -> CategoricalImage {
        let height = u32::try_from(rows.len()).unwrap();
        let width = u32::try_from(rows[0].len()).unwrap();
        CategoricalImage::from_fn(width, height, |x, y| {
            Luma([rows[y as usize][x as usize]])
        })
    }

    #[test]
    fn tables_have_expected_sizes() {
        assert_eq!(TAB10.len(), 10);
        assert_eq!(TAB20.len(), 20);
        assert_eq!(TAB10.name(), "tab10");
        assert_eq!(TAB20.name(), "tab20");
    }

    #[test]
    fn table_colors_are_distinct() {
        for table in [TAB10, TAB20] {
            let colors = table.colors();
            for (i, a) in colors.iter().enumerate() {
                for b in &colors[i + 1..] {
                    assert_ne!(a, b, "duplicate color in {}", table.name());
                }
            }
        }
    }

    #[test]
    fn slot_endpoints() {
        assert_eq!(TAB10.slot(0.0), 0);
        assert_eq!(TAB10.slot(1.0), 9);
        assert_eq!(TAB20.slot(1.0), 19);
        assert_eq!(TAB10.slot(0.5), 5);
    }

    #[test]
    fn slot_truncates() {
        // 0.19 * 10 = 1.9 -> slot 1, not 2.
        assert_eq!(TAB10.slot(0.19), 1);
        // 1/19 * 20 = 1.05 -> slot 1.
        assert_eq!(TAB20.slot(1.0 / 19.0), 1);
    }

    #[test]
    fn slot_clamps_out_of_range() {
        assert_eq!(TAB10.slot(-0.5), 0);
        assert_eq!(TAB10.slot(3.0), 9);
    }

    #[test]
    fn sample_matches_table_color() {
        assert_eq!(TAB10.sample(0.0), [0x1f, 0x77, 0xb4]);
        assert_eq!(TAB10.sample(1.0), [0x17, 0xbe, 0xcf]);
        assert_eq!(TAB20.sample(1.0), [0x9e, 0xda, 0xe5]);
    }

    #[test]
    fn colorize_preserves_dimensions() {
        let img = CategoricalImage::from_fn(7, 3, |x, _| Luma([u8::try_from(x).unwrap()]));
        let rendered = colorize(&img, &TAB20).unwrap();
        assert_eq!(rendered.dimensions(), (7, 3));
    }

    #[test]
    fn colorize_two_classes_uses_first_and_last_slots() {
        let img = image_from_rows(&[&[0, 1], &[1, 0]]);
        let rendered = colorize(&img, &TAB10).unwrap();
        assert_eq!(rendered.get_pixel(0, 0).0, TAB10.colors()[0]);
        assert_eq!(rendered.get_pixel(1, 0).0, TAB10.colors()[9]);
        assert_eq!(rendered.get_pixel(0, 0), rendered.get_pixel(1, 1));
    }

    #[test]
    fn cityscapes_range_hits_exact_tab20_slots() {
        // Label ids 0..=33: slot = trunc(i / 33 * 20), with 33 itself in
        // the last slot. Table bytes come back unchanged.
        let img = CategoricalImage::from_fn(34, 1, |x, _| Luma([u8::try_from(x).unwrap()]));
        let rendered = colorize(&img, &TAB20).unwrap();
        for i in 0..=33u32 {
            let slot = if i == 33 { 19 } else { usize::try_from(i * 20 / 33).unwrap() };
            assert_eq!(
                rendered.get_pixel(i, 0).0,
                TAB20.colors()[slot],
                "index {i} should use slot {slot}"
            );
        }
        assert_eq!(rendered.get_pixel(1, 0).0, TAB20.colors()[0]);
        assert_eq!(rendered.get_pixel(2, 0).0, TAB20.colors()[1]);
        assert_eq!(rendered.get_pixel(32, 0).0, TAB20.colors()[19]);
    }

    #[test]
    fn colorize_is_deterministic() {
        let img = CategoricalImage::from_fn(16, 16, |x, y| {
            Luma([u8::try_from((x * 3 + y * 5) % 34).unwrap()])
        });
        let a = colorize(&img, &TAB20).unwrap();
        let b = colorize(&img, &TAB20).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn normalization_is_per_image() {
        // Index 5 is the maximum in the first image but not the second,
        // so it lands in different slots.
        let small = image_from_rows(&[&[0, 5]]);
        let large = image_from_rows(&[&[0, 5, 10]]);

        let a = colorize(&small, &TAB10).unwrap();
        let b = colorize(&large, &TAB10).unwrap();

        assert_eq!(a.get_pixel(1, 0).0, TAB10.colors()[9]);
        assert_eq!(b.get_pixel(1, 0).0, TAB10.colors()[5]);
        assert_ne!(a.get_pixel(1, 0), b.get_pixel(1, 0));
    }

    #[test]
    fn colorize_nonzero_minimum() {
        // Minimum 3 is still divided by the maximum, not shifted to 0.
        let img = image_from_rows(&[&[3, 6]]);
        let rendered = colorize(&img, &TAB10).unwrap();
        assert_eq!(rendered.get_pixel(0, 0).0, TAB10.colors()[5]);
        assert_eq!(rendered.get_pixel(1, 0).0, TAB10.colors()[9]);
    }

    #[test]
    fn all_zero_image_is_degenerate() {
        let img = CategoricalImage::from_pixel(4, 4, Luma([0]));
        let result = colorize(&img, &TAB20);
        assert!(matches!(
            result,
            Err(RenderError::DegenerateImage { class_index: 0 })
        ));
    }

    #[test]
    fn single_nonzero_class_is_degenerate() {
        let img = CategoricalImage::from_pixel(3, 2, Luma([7]));
        let result = colorize(&img, &TAB10);
        assert!(matches!(
            result,
            Err(RenderError::DegenerateImage { class_index: 7 })
        ));
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = CategoricalImage::new(0, 0);
        assert!(matches!(
            colorize(&img, &TAB10),
            Err(RenderError::EmptyInput)
        ));
    }
}
