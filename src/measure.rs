//! Text measurement capabilities
//!
//! Two injected capabilities back the fitter and renderer:
//! - [`TextMeasure`]: advance width of a string at a font size.
//! - [`HeightMeasure`]: visual (ink) height of the tallest shaped glyph,
//!   used for vertical rhythm instead of the nominal font size so mixed
//!   fonts and scripts space consistently.
//!
//! [`ShapedMeasurer`] implements both via rustybuzz shaping over a
//! [`FontRegistry`]; [`EstimatedMeasure`] is the deterministic constant-ratio
//! estimator used when no shaping backend or font data is available. Both
//! are pure and never fail: a missing font or degenerate shaping result
//! degrades to the estimate with a diagnostic.

use rustybuzz::ttf_parser::GlyphId;
use rustybuzz::{Face, UnicodeBuffer, shape};

use crate::font::FontRegistry;

/// Height of text as a fraction of the nominal size when shaping is
/// unavailable or degenerate.
pub const FALLBACK_HEIGHT_RATIO: f32 = 0.75;

/// Advance width per character as a fraction of the nominal size when
/// shaping is unavailable.
pub const FALLBACK_ADVANCE_RATIO: f32 = 0.5;

/// Advance-width oracle. Must be deterministic for identical inputs.
pub trait TextMeasure {
    /// Width of `text` in the given font at `size`, unscaled.
    fn width(&self, text: &str, font: &str, size: f32) -> f32;
}

/// Glyph ink-height oracle.
pub trait HeightMeasure {
    /// Visual height of the tallest glyph of `text` at `size`.
    ///
    /// Always returns a value in `(0, size]`.
    fn ink_height(&self, text: &str, font: &str, size: f32) -> f32;
}

/// Shaping-backed measurer over a font registry.
pub struct ShapedMeasurer<'a> {
    fonts: &'a FontRegistry,
}

impl<'a> ShapedMeasurer<'a> {
    /// Create a measurer borrowing the registry.
    pub fn new(fonts: &'a FontRegistry) -> Self {
        Self { fonts }
    }

    fn shaped<T>(
        &self,
        text: &str,
        font: &str,
        f: impl FnOnce(&Face, &rustybuzz::GlyphBuffer) -> T,
    ) -> Option<T> {
        self.fonts.with_face_data(font, |data, index| {
            let face = Face::from_slice(data, index)?;
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(text);
            let output = shape(&face, &[], buffer);
            Some(f(&face, &output))
        })?
    }
}

impl TextMeasure for ShapedMeasurer<'_> {
    fn width(&self, text: &str, font: &str, size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let shaped = self.shaped(text, font, |face, output| {
            let scale = size / face.units_per_em() as f32;
            output
                .glyph_positions()
                .iter()
                .map(|pos| pos.x_advance as f32 * scale)
                .sum::<f32>()
        });
        match shaped {
            Some(width) => width,
            None => {
                tracing::debug!(font, "width measurement unavailable, using estimate");
                EstimatedMeasure::new().width(text, font, size)
            }
        }
    }
}

impl HeightMeasure for ShapedMeasurer<'_> {
    fn ink_height(&self, text: &str, font: &str, size: f32) -> f32 {
        if text.trim().is_empty() {
            return size * FALLBACK_HEIGHT_RATIO;
        }
        let shaped = self.shaped(text, font, |face, output| {
            let scale = size / face.units_per_em() as f32;
            let mut y_min = i32::MAX;
            let mut y_max = i32::MIN;
            for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
                let Some(bbox) = face.glyph_bounding_box(GlyphId(info.glyph_id as u16)) else {
                    continue;
                };
                // Zero-area glyphs (spaces) carry no ink.
                if bbox.x_min == bbox.x_max || bbox.y_min == bbox.y_max {
                    continue;
                }
                y_min = y_min.min(bbox.y_min as i32 + pos.y_offset);
                y_max = y_max.max(bbox.y_max as i32 + pos.y_offset);
            }
            if y_max <= y_min {
                return None;
            }
            Some((y_max - y_min) as f32 * scale)
        });
        match shaped.flatten() {
            Some(height) if height > 0.0 && height <= 2.0 * size => height.min(size),
            Some(height) => {
                tracing::warn!(
                    font,
                    height,
                    size,
                    "degenerate ink height, using estimate"
                );
                size * FALLBACK_HEIGHT_RATIO
            }
            None => {
                tracing::debug!(font, "no visible glyphs shaped, using estimate");
                size * FALLBACK_HEIGHT_RATIO
            }
        }
    }
}

/// Constant-ratio estimator.
///
/// Deterministic stand-in for the shaping-backed measurer: every character
/// advances by the same fraction of the font size and every line reports the
/// same ink height.
#[derive(Debug, Clone, Copy)]
pub struct EstimatedMeasure {
    /// Per-character advance as a fraction of the font size.
    pub advance_ratio: f32,
}

impl EstimatedMeasure {
    /// Create with the default advance ratio.
    pub fn new() -> Self {
        Self {
            advance_ratio: FALLBACK_ADVANCE_RATIO,
        }
    }

    /// Create with a specific advance ratio.
    pub fn with_advance_ratio(advance_ratio: f32) -> Self {
        Self { advance_ratio }
    }
}

impl Default for EstimatedMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for EstimatedMeasure {
    fn width(&self, text: &str, _font: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * self.advance_ratio
    }
}

impl HeightMeasure for EstimatedMeasure {
    fn ink_height(&self, _text: &str, _font: &str, size: f32) -> f32 {
        size * FALLBACK_HEIGHT_RATIO
    }
}
