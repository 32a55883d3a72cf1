//! Line, segment and bounds value types
//!
//! A [`Line`] is the unit of layout: one logical row of text with optional
//! prefix/suffix segments (ordinal markers, durations) rendered outside the
//! compression applied to the main text. Lines are immutable values: the
//! fitter never mutates one in place, it produces changed-field copies, so
//! the shrink loop's termination reasoning stays simple and fitting calls
//! are safe to run in parallel.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{LayoutError, Result};

/// Caller-supplied association carried through splits unchanged
/// (e.g. which track a line represents). Downcast on the way out.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Flanking content with its own font and fixed horizontal scale.
///
/// An absent segment and an empty-text segment are distinct: only the
/// former contributes nothing to width.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Segment text.
    pub text: String,
    /// Font identifier; `None` resolves to the owning line's font.
    pub font: Option<String>,
    /// Fixed horizontal scale, never altered by fitting.
    pub scale: f32,
}

impl Segment {
    /// Create a segment in the owning line's font at scale 1.0.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: None,
            scale: 1.0,
        }
    }

    /// Set the segment font.
    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    /// Set the fixed horizontal scale.
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// A logical line of text to lay out.
#[derive(Clone)]
pub struct Line {
    /// Primary content.
    pub text: String,
    /// Optional leading segment (e.g. " 9.").
    pub prefix: Option<Segment>,
    /// Optional trailing segment (e.g. "3:41").
    pub suffix: Option<Segment>,
    /// Font identifier for `text`.
    pub font: String,
    /// Requested font size in document units.
    pub size: f32,
    /// Measured ink height at `size`; zero until the block fitter measures.
    pub measured_height: f32,
    /// Fraction of `measured_height` used as the gap before the next line.
    pub leading_ratio: f32,
    /// If true, `size` is never altered by the block fitter.
    pub fixed_size: bool,
    /// Output of fitting; always in `[min_scale, 1.0]`.
    pub horizontal_scale: f32,
    /// How many times this line was produced by splitting an original line.
    pub split_generation: u32,
    /// Opaque caller association, carried through splits.
    pub payload: Option<Payload>,
}

impl Line {
    /// Create a line with default spacing (no leading gap, flexible size).
    pub fn new(text: impl Into<String>, font: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            prefix: None,
            suffix: None,
            font: font.into(),
            size,
            measured_height: 0.0,
            leading_ratio: 0.0,
            fixed_size: false,
            horizontal_scale: 1.0,
            split_generation: 0,
            payload: None,
        }
    }

    /// Create an empty spacer line: consumes vertical advancement, draws nothing.
    pub fn spacer(font: impl Into<String>, size: f32, leading_ratio: f32) -> Self {
        Self::new("", font, size).leading_ratio(leading_ratio)
    }

    /// Set the leading ratio.
    pub fn leading_ratio(mut self, ratio: f32) -> Self {
        self.leading_ratio = ratio;
        self
    }

    /// Mark the size as fixed: the block fitter never shrinks this line.
    pub fn fixed(mut self) -> Self {
        self.fixed_size = true;
        self
    }

    /// Attach a prefix segment.
    pub fn prefix(mut self, segment: Segment) -> Self {
        self.prefix = Some(segment);
        self
    }

    /// Attach a suffix segment.
    pub fn suffix(mut self, segment: Segment) -> Self {
        self.suffix = Some(segment);
        self
    }

    /// Attach a caller payload.
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Copy with different text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let mut line = self.clone();
        line.text = text.into();
        line
    }

    /// Copy with a different horizontal scale.
    pub fn with_scale(&self, scale: f32) -> Self {
        let mut line = self.clone();
        line.horizontal_scale = scale;
        line
    }

    /// Copy with a different measured height.
    pub fn with_measured_height(&self, height: f32) -> Self {
        let mut line = self.clone();
        line.measured_height = height;
        line
    }

    /// Copy with size and measured height multiplied by `ratio`, floored at
    /// `min_size`. Height scales proportionally so the vertical formula
    /// keeps one consistent basis.
    pub fn shrunk(&self, ratio: f32, min_size: f32) -> Self {
        let mut line = self.clone();
        let floored = (self.size * ratio).max(min_size);
        let applied = floored / self.size;
        line.size = floored;
        line.measured_height = self.measured_height * applied;
        line
    }

    /// Copy as a physical line produced by splitting this one.
    ///
    /// Carries the payload; prefix and suffix stay on the first physical
    /// line only when `first` is set.
    pub fn split_child(&self, text: impl Into<String>, first: bool) -> Self {
        let mut line = self.with_text(text);
        line.split_generation = self.split_generation + 1;
        if !first {
            line.prefix = None;
            line.suffix = None;
        }
        line
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Line")
            .field("text", &self.text)
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("font", &self.font)
            .field("size", &self.size)
            .field("measured_height", &self.measured_height)
            .field("leading_ratio", &self.leading_ratio)
            .field("fixed_size", &self.fixed_size)
            .field("horizontal_scale", &self.horizontal_scale)
            .field("split_generation", &self.split_generation)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

/// An axis-aligned region already reduced by padding, in the caller's
/// current coordinate system (y grows upward, text draws above its baseline).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Create bounds, rejecting non-finite or negative dimensions.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self> {
        for (name, v) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !v.is_finite() || v < 0.0 {
                return Err(LayoutError::InvalidBounds(format!("{name} = {v}")));
            }
        }
        Ok(Self { x, y, width, height })
    }

    /// Top edge (`y + height`).
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Canonical block height: every line contributes its measured height, and
/// every line except the last additionally contributes its leading gap.
///
/// This is the single vertical formula in the crate; the block fitter and
/// the renderer both use it, so a block that fits also renders inside its
/// region.
pub fn block_height(lines: &[Line]) -> f32 {
    let mut total = 0.0;
    for (i, line) in lines.iter().enumerate() {
        total += line.measured_height;
        if i + 1 < lines.len() {
            total += line.measured_height * line.leading_ratio;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::new(0.0, 0.0, 100.0, 50.0).is_ok());
        assert!(Bounds::new(-1.0, 0.0, 100.0, 50.0).is_err());
        assert!(Bounds::new(0.0, 0.0, f32::NAN, 50.0).is_err());
        assert!(Bounds::new(0.0, 0.0, f32::INFINITY, 50.0).is_err());
    }

    #[test]
    fn test_block_height_skips_trailing_gap() {
        let line = |h: f32, leading: f32| {
            Line::new("x", "f", 10.0)
                .leading_ratio(leading)
                .with_measured_height(h)
        };
        let lines = vec![line(8.0, 0.5), line(8.0, 0.5)];
        // 8 + 8*0.5 + 8, no gap after the last line.
        assert_eq!(block_height(&lines), 20.0);
        assert_eq!(block_height(&lines[..1]), 8.0);
        assert_eq!(block_height(&[]), 0.0);
    }

    #[test]
    fn test_shrunk_scales_height_proportionally() {
        let line = Line::new("x", "f", 10.0).with_measured_height(8.0);
        let s = line.shrunk(0.9, 4.0);
        assert!((s.size - 9.0).abs() < 1e-6);
        assert!((s.measured_height - 7.2).abs() < 1e-6);
        // Floor keeps size and height in ratio.
        let floored = line.shrunk(0.1, 4.0);
        assert!((floored.size - 4.0).abs() < 1e-6);
        assert!((floored.measured_height - 3.2).abs() < 1e-6);
    }

    #[test]
    fn test_split_child_carries_payload_and_generation() {
        let payload: Payload = Arc::new(7u32);
        let line = Line::new("a b", "f", 10.0)
            .prefix(Segment::new("1."))
            .suffix(Segment::new("3:41"))
            .payload(payload);
        let first = line.split_child("a", true);
        let rest = line.split_child("b", false);
        assert_eq!(first.split_generation, 1);
        assert!(first.prefix.is_some() && first.suffix.is_some());
        assert!(rest.prefix.is_none() && rest.suffix.is_none());
        let tag = rest.payload.as_ref().unwrap().downcast_ref::<u32>();
        assert_eq!(tag, Some(&7));
    }
}
