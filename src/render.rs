//! Canonical rendering of fitted lines
//!
//! Consumes the block fitter's output and a bounding region and emits draw
//! calls through an abstract surface. Vertical advancement uses the same
//! formula as [`block_height`], so a block the fitter reports as fitting
//! renders inside its region byte-for-byte reproducibly.

use crate::line::{Bounds, Line, Segment, block_height};
use crate::measure::TextMeasure;
use crate::Result;

/// Minimal stateful 2D canvas abstraction supplied by the caller.
///
/// `draw_text` draws at the current origin; positioning happens through
/// `translate`, horizontal compression through `scale(sx, 1.0)`, both
/// wrapped in `save`/`restore` pairs per drawn piece.
pub trait DrawSurface {
    fn draw_text(&mut self, text: &str, font: &str, size: f32);
    fn translate(&mut self, dx: f32, dy: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn save(&mut self);
    fn restore(&mut self);
}

/// Horizontal placement of a line within its bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    /// Prefix flush left, suffix flush right.
    #[default]
    Left,
    /// Prefix, text and suffix centered as one unit.
    Center,
}

/// Vertical placement of the whole block within its bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

fn draw_piece(
    surface: &mut dyn DrawSurface,
    text: &str,
    font: &str,
    size: f32,
    x: f32,
    y: f32,
    scale: f32,
) {
    if text.is_empty() {
        return;
    }
    surface.save();
    surface.translate(x, y);
    if scale < 1.0 {
        surface.scale(scale, 1.0);
    }
    surface.draw_text(text, font, size);
    surface.restore();
}

fn segment_parts<'a>(line: &'a Line, segment: &'a Option<Segment>) -> (&'a str, &'a str, f32) {
    match segment {
        Some(seg) => (
            seg.text.as_str(),
            seg.font.as_deref().unwrap_or(&line.font),
            seg.scale,
        ),
        None => ("", &line.font, 1.0),
    }
}

/// Render fitted lines into `bounds`, top-down, returning the baseline y of
/// the last line.
///
/// Empty-text spacer lines consume their advancement but emit no draw call.
/// Only drawing side effects go through `surface`; measurement uses the same
/// oracle the fitter used.
pub fn render(
    lines: &[Line],
    bounds: &Bounds,
    align: Align,
    valign: VAlign,
    measure: &dyn TextMeasure,
    surface: &mut dyn DrawSurface,
) -> Result<f32> {
    // Bounds may have been built directly; re-check at the boundary.
    Bounds::new(bounds.x, bounds.y, bounds.width, bounds.height)?;

    let total = block_height(lines);
    let vertical_offset = match valign {
        VAlign::Top => 0.0,
        VAlign::Center => (bounds.height - total) / 2.0,
        VAlign::Bottom => bounds.height - total,
    };

    let mut y = bounds.top() - vertical_offset;
    let mut baseline = y;

    for (i, line) in lines.iter().enumerate() {
        y -= line.measured_height;
        baseline = y;

        let (prefix_text, prefix_font, prefix_scale) = segment_parts(line, &line.prefix);
        let (suffix_text, suffix_font, suffix_scale) = segment_parts(line, &line.suffix);
        let prefix_width = measure.width(prefix_text, prefix_font, line.size) * prefix_scale;
        let suffix_width = measure.width(suffix_text, suffix_font, line.size) * suffix_scale;
        let text_width =
            measure.width(&line.text, &line.font, line.size) * line.horizontal_scale;

        let (prefix_x, text_x, suffix_x) = match align {
            Align::Left => (
                bounds.x,
                bounds.x + prefix_width,
                bounds.right() - suffix_width,
            ),
            Align::Center => {
                let unit = prefix_width + text_width + suffix_width;
                let start = bounds.x + (bounds.width - unit) / 2.0;
                (start, start + prefix_width, start + prefix_width + text_width)
            }
        };

        draw_piece(surface, prefix_text, prefix_font, line.size, prefix_x, y, prefix_scale);
        draw_piece(
            surface,
            &line.text,
            &line.font,
            line.size,
            text_x,
            y,
            line.horizontal_scale,
        );
        draw_piece(surface, suffix_text, suffix_font, line.size, suffix_x, y, suffix_scale);

        if i + 1 < lines.len() {
            y -= line.measured_height * line.leading_ratio;
        }
    }

    Ok(baseline)
}
