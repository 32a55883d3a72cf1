//! Constrained text fitting
//!
//! Two levels drive the layout:
//! - [`fit_line`] resolves one logical line against an available width at its
//!   current size: unmodified, horizontally compressed, split at word
//!   boundaries, or truncated with an ellipsis.
//! - [`fit_block`] runs the per-line fitter across a whole block and
//!   iteratively shrinks non-fixed sizes until the block height fits the
//!   region or the size floor is reached.
//!
//! Overflow is a normal outcome: the block fitter returns its best-effort
//! layout rather than failing. Only malformed inputs (non-finite widths,
//! non-positive sizes) are rejected.

use crate::line::{Line, Segment, block_height};
use crate::measure::{HeightMeasure, TextMeasure};
use crate::{LayoutError, Result};

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "\u{2026}";

/// Fitting constraints.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    /// Lowest horizontal compression applied to text.
    pub min_scale: f32,
    /// How many times an original line may be split into physical lines.
    pub max_splits: u32,
    /// Per-iteration multiplier on non-fixed sizes, just under 1.
    pub shrink_ratio: f32,
    /// Floor for non-fixed font sizes.
    pub min_size: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            min_scale: 0.7,
            max_splits: 1,
            shrink_ratio: 0.95,
            min_size: 4.0,
        }
    }
}

impl FitOptions {
    fn validate(&self) -> Result<()> {
        if !(self.min_scale > 0.0 && self.min_scale <= 1.0) {
            return Err(LayoutError::InvalidConstraint(format!(
                "min_scale = {}",
                self.min_scale
            )));
        }
        if !(self.shrink_ratio > 0.0 && self.shrink_ratio < 1.0) {
            return Err(LayoutError::InvalidConstraint(format!(
                "shrink_ratio = {}",
                self.shrink_ratio
            )));
        }
        if !(self.min_size > 0.0 && self.min_size.is_finite()) {
            return Err(LayoutError::InvalidConstraint(format!(
                "min_size = {}",
                self.min_size
            )));
        }
        Ok(())
    }
}

fn segment_width(line: &Line, segment: &Option<Segment>, measure: &dyn TextMeasure) -> f32 {
    match segment {
        Some(seg) => {
            let font = seg.font.as_deref().unwrap_or(&line.font);
            measure.width(&seg.text, font, line.size) * seg.scale
        }
        None => 0.0,
    }
}

/// Fit one logical line into `available_width`, producing one or more
/// physical lines.
///
/// Strategies in order: keep as-is, compress down to `min_scale`, split at
/// word boundaries (bounded by `max_splits` generations), truncate with an
/// ellipsis. All physical lines produced from one input share a single
/// horizontal scale so related text compresses consistently.
pub fn fit_line(
    line: &Line,
    available_width: f32,
    opts: &FitOptions,
    measure: &dyn TextMeasure,
) -> Vec<Line> {
    let prefix_width = segment_width(line, &line.prefix, measure);
    let suffix_width = segment_width(line, &line.suffix, measure);
    let effective_width = available_width - prefix_width - suffix_width;

    // Prefix and suffix already consume the region: the degenerate
    // "does not fit" result is an ellipsis-only line, never a panic.
    if effective_width <= 0.0 {
        return vec![line.with_text(ELLIPSIS).with_scale(opts.min_scale)];
    }

    let base_width = measure.width(&line.text, &line.font, line.size);
    if base_width <= effective_width {
        return vec![line.with_scale(1.0)];
    }

    let needed_scale = effective_width / base_width;
    if needed_scale >= opts.min_scale {
        return vec![line.with_scale(needed_scale)];
    }

    let width_of = |text: &str| measure.width(text, &line.font, line.size);

    if line.split_generation >= opts.max_splits {
        let truncated = truncate_to_width(&line.text, effective_width, opts.min_scale, &width_of);
        return vec![line.with_text(truncated).with_scale(opts.min_scale)];
    }

    let segments = greedy_split(&line.text, effective_width, &width_of);
    if segments.is_empty() {
        return vec![line.with_scale(opts.min_scale)];
    }

    // One shared scale: the worst any segment needs. Only segments holding a
    // single oversized word can need less than 1.0 after a greedy split.
    let needed: Vec<f32> = segments
        .iter()
        .map(|seg| (effective_width / width_of(seg)).min(1.0))
        .collect();
    let worst = needed.iter().copied().fold(1.0_f32, f32::min);
    let shared_scale = worst.max(opts.min_scale);

    let last = segments.len() - 1;
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            let text = if i == last && needed[last] < opts.min_scale {
                // Even split can't reach min_scale on the tail: truncate it.
                truncate_to_width(seg, effective_width, opts.min_scale, &width_of)
            } else {
                seg.clone()
            };
            line.split_child(text, i == 0).with_scale(shared_scale)
        })
        .collect()
}

/// Greedily pack words into the fewest segments whose unscaled width fits
/// `max_width`. A single word wider than the limit gets its own segment.
fn greedy_split(text: &str, max_width: f32, width_of: &impl Fn(&str) -> f32) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
            continue;
        }
        let candidate = format!("{current} {word}");
        if width_of(&candidate) <= max_width {
            current = candidate;
        } else {
            segments.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Truncate at the last whole word fitting `max_width` at `scale`, with an
/// ellipsis appended. Falls back to the ellipsis alone when nothing fits.
fn truncate_to_width(
    text: &str,
    max_width: f32,
    scale: f32,
    width_of: &impl Fn(&str) -> f32,
) -> String {
    let mut best = String::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        if width_of(&format!("{current}{ELLIPSIS}")) * scale <= max_width {
            best = current.clone();
        } else {
            break;
        }
    }
    format!("{best}{ELLIPSIS}")
}

/// Fit a block of lines into `available_width` x `available_height`.
///
/// The input is copied, never mutated; the result is the full physical-line
/// expansion, possibly still overflowing when every line is fixed or the
/// size floor is reached.
pub fn fit_block(
    lines: &[Line],
    available_width: f32,
    available_height: f32,
    opts: &FitOptions,
    measure: &dyn TextMeasure,
    heights: &dyn HeightMeasure,
) -> Result<Vec<Line>> {
    for (name, v) in [("width", available_width), ("height", available_height)] {
        if !v.is_finite() || v < 0.0 {
            return Err(LayoutError::InvalidConstraint(format!("available {name} = {v}")));
        }
    }
    opts.validate()?;
    for line in lines {
        if !line.size.is_finite() || line.size <= 0.0 {
            return Err(LayoutError::InvalidConstraint(format!(
                "line size = {} for {:?}",
                line.size, line.text
            )));
        }
        if !line.leading_ratio.is_finite() || line.leading_ratio < 0.0 {
            return Err(LayoutError::InvalidConstraint(format!(
                "leading_ratio = {} for {:?}",
                line.leading_ratio, line.text
            )));
        }
    }
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let mut working: Vec<Line> = lines
        .iter()
        .map(|l| l.with_measured_height(heights.ink_height(&l.text, &l.font, l.size)))
        .collect();

    loop {
        let mut expanded = Vec::new();
        for line in &working {
            for fitted in fit_line(line, available_width, opts, measure) {
                let height = heights.ink_height(&fitted.text, &fitted.font, fitted.size);
                expanded.push(fitted.with_measured_height(height));
            }
        }

        let total = block_height(&expanded);
        if total <= available_height {
            return Ok(expanded);
        }

        let smallest_flexible = working
            .iter()
            .filter(|l| !l.fixed_size)
            .map(|l| l.size)
            .fold(f32::INFINITY, f32::min);
        if !smallest_flexible.is_finite() || smallest_flexible <= opts.min_size {
            tracing::debug!(
                total,
                available_height,
                "block still overflows at the size floor, returning best effort"
            );
            return Ok(expanded);
        }

        tracing::trace!(total, available_height, "shrinking block");
        working = working
            .iter()
            .map(|l| {
                if l.fixed_size {
                    l.clone()
                } else {
                    l.shrunk(opts.shrink_ratio, opts.min_size)
                }
            })
            .collect();
    }
}

/// Largest integer font size in `[min_size, max_size]` at which `text` fits
/// `max_width` x `max_height`, with `safe_margin` subtracted symmetrically
/// from both limits. One-shot headline sizing, outside the iterative fitter.
pub fn max_font_size(
    text: &str,
    font: &str,
    max_width: f32,
    max_height: f32,
    min_size: f32,
    max_size: f32,
    safe_margin: f32,
    measure: &dyn TextMeasure,
) -> f32 {
    let effective_width = max_width - safe_margin * 2.0;
    let effective_height = max_height - safe_margin * 2.0;

    let mut size = max_size.floor();
    while size >= min_size {
        let width = measure.width(text, font, size);
        if width <= effective_width && size <= effective_height {
            return size;
        }
        size -= 1.0;
    }
    min_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::EstimatedMeasure;

    // One unit per character at size 10, independent of font.
    struct CharWidth;

    impl TextMeasure for CharWidth {
        fn width(&self, text: &str, _font: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size * 0.1
        }
    }

    fn opts() -> FitOptions {
        FitOptions::default()
    }

    #[test]
    fn test_fits_unmodified() {
        let line = Line::new("Side A", "f", 10.0);
        let out = fit_line(&line, 100.0, &opts(), &CharWidth);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "Side A");
        assert_eq!(out[0].horizontal_scale, 1.0);
        assert_eq!(out[0].split_generation, 0);
    }

    #[test]
    fn test_compresses_within_min_scale() {
        // 12 chars -> width 12 at size 10; 10 available -> scale 10/12.
        let line = Line::new("abcdefghijkl", "f", 10.0);
        let out = fit_line(&line, 10.0, &opts(), &CharWidth);
        assert_eq!(out.len(), 1);
        assert!((out[0].horizontal_scale - 10.0 / 12.0).abs() < 1e-6);
        assert_eq!(out[0].text, "abcdefghijkl");
    }

    #[test]
    fn test_splits_at_word_boundary() {
        // Two 9-char words + space: width 19 into 10 needs scale 0.53,
        // below the floor, so the line reflows at the word boundary.
        let line = Line::new("abcdefghi abcdefghi", "f", 10.0);
        let out = fit_line(&line, 10.0, &opts(), &CharWidth);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "abcdefghi");
        assert_eq!(out[1].text, "abcdefghi");
        assert_eq!(out[0].horizontal_scale, out[1].horizontal_scale);
        assert_eq!(out[0].horizontal_scale, 1.0);
        assert!(out.iter().all(|l| l.split_generation == 1));
    }

    #[test]
    fn test_truncates_when_split_budget_spent() {
        let mut line = Line::new("abcdefghi abcdefghi", "f", 10.0);
        line.split_generation = 1;
        let out = fit_line(&line, 10.0, &opts(), &CharWidth);
        assert_eq!(out.len(), 1);
        assert!(out[0].text.ends_with(ELLIPSIS));
        assert_eq!(out[0].horizontal_scale, opts().min_scale);
        // "abcdefghi…" is 10 chars -> width 10, times 0.7 fits in 10.
        assert_eq!(out[0].text, format!("abcdefghi{ELLIPSIS}"));
    }

    #[test]
    fn test_oversized_single_word_gets_own_segment() {
        // 20-char word cannot fit 10 units even at min_scale; splitting
        // leaves it alone and the tail gets truncated.
        let line = Line::new("abcdefghijklmnopqrst x", "f", 10.0);
        let out = fit_line(&line, 10.0, &opts(), &CharWidth);
        assert!(out.len() >= 2);
        assert!(out.iter().all(|l| l.horizontal_scale >= opts().min_scale));
        let scales: Vec<f32> = out.iter().map(|l| l.horizontal_scale).collect();
        assert!(scales.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_split_tail_truncates_when_word_too_wide() {
        // The last segment is a single 20-char word that needs scale 0.5
        // even alone: it gets ellipsized while sharing the clamped scale.
        let line = Line::new("x abcdefghijklmnopqrst", "f", 10.0);
        let out = fit_line(&line, 10.0, &opts(), &CharWidth);
        assert!(out.len() >= 2);
        let scales: Vec<f32> = out.iter().map(|l| l.horizontal_scale).collect();
        assert!(scales.windows(2).all(|w| w[0] == w[1]));
        assert!(scales[0] >= opts().min_scale && scales[0] <= 1.0);
        assert!(out.last().unwrap().text.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_degenerate_effective_width() {
        use crate::line::Segment;
        // Prefix alone is wider than the region.
        let line = Line::new("hello", "f", 10.0).prefix(Segment::new("0123456789012345"));
        let out = fit_line(&line, 10.0, &opts(), &CharWidth);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, ELLIPSIS);
        assert_eq!(out[0].horizontal_scale, opts().min_scale);
    }

    #[test]
    fn test_prefix_suffix_reduce_effective_width() {
        use crate::line::Segment;
        // 8 chars of text, 100 wide region; prefix (3) + suffix (4)
        // leave 93, so the text still fits at 1.0.
        let line = Line::new("abcdefgh", "f", 10.0)
            .prefix(Segment::new(" 9."))
            .suffix(Segment::new("3:41"));
        let out = fit_line(&line, 100.0, &opts(), &CharWidth);
        assert_eq!(out[0].horizontal_scale, 1.0);

        // Narrow region: 12 available, prefix+suffix take 8, text needs
        // 8 into 4 -> 0.5 < min_scale -> split (each word its own line).
        let tight = Line::new("abcd efgh", "f", 10.0)
            .prefix(Segment::new("1234"))
            .suffix(Segment::new("5678"));
        let out = fit_line(&tight, 12.0, &opts(), &CharWidth);
        assert_eq!(out.len(), 2);
        assert!(out[0].prefix.is_some());
        assert!(out[1].prefix.is_none());
    }

    #[test]
    fn test_segment_scale_is_fixed() {
        use crate::line::Segment;
        // Prefix at scale 0.5 consumes half its natural width.
        let line = Line::new("abcdef", "f", 10.0).prefix(Segment::new("12345678").scale(0.5));
        // 10 available - 4 prefix = 6 effective, text is 6 wide -> fits.
        let out = fit_line(&line, 10.0, &opts(), &CharWidth);
        assert_eq!(out[0].horizontal_scale, 1.0);
    }

    #[test]
    fn test_block_shrinks_until_fit() {
        let heights = EstimatedMeasure::new();
        let lines: Vec<Line> = (0..10)
            .map(|i| Line::new(format!("track {i}"), "f", 10.0).leading_ratio(0.125))
            .collect();
        // At size 10 each line is 7.5 high: total 75 + 9 gaps of 0.9375.
        let out = fit_block(&lines, 200.0, 60.0, &opts(), &CharWidth, &heights).unwrap();
        assert_eq!(out.len(), 10);
        let sizes: Vec<f32> = out.iter().map(|l| l.size).collect();
        assert!(sizes.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-6));
        assert!(sizes[0] < 10.0);
        assert!(block_height(&out) <= 60.0);
    }

    #[test]
    fn test_block_fixed_lines_never_shrink() {
        let heights = EstimatedMeasure::new();
        let lines = vec![
            Line::new("Side A", "f", 12.0).fixed().leading_ratio(0.0625),
            Line::new("a long track title", "f", 10.0).leading_ratio(0.125),
            Line::new("another track title", "f", 10.0).leading_ratio(0.125),
        ];
        let out = fit_block(&lines, 200.0, 18.0, &opts(), &CharWidth, &heights).unwrap();
        assert_eq!(out[0].size, 12.0);
        assert!(out[1].size < 10.0);
    }

    #[test]
    fn test_block_all_fixed_returns_best_effort() {
        let heights = EstimatedMeasure::new();
        let lines = vec![
            Line::new("Side A", "f", 12.0).fixed(),
            Line::new("Side B", "f", 12.0).fixed(),
        ];
        // 9 + 9 = 18 cannot fit in 5, but the call still succeeds.
        let out = fit_block(&lines, 200.0, 5.0, &opts(), &CharWidth, &heights).unwrap();
        assert_eq!(out.len(), 2);
        assert!(block_height(&out) > 5.0);
        assert_eq!(out[0].size, 12.0);
    }

    #[test]
    fn test_block_stops_at_size_floor() {
        let heights = EstimatedMeasure::new();
        let lines: Vec<Line> = (0..50)
            .map(|_| Line::new("x", "f", 10.0).leading_ratio(0.1))
            .collect();
        let out = fit_block(&lines, 200.0, 10.0, &opts(), &CharWidth, &heights).unwrap();
        assert_eq!(out.len(), 50);
        assert!(out.iter().all(|l| l.size >= opts().min_size));
    }

    #[test]
    fn test_block_rejects_bad_constraints() {
        let heights = EstimatedMeasure::new();
        let lines = vec![Line::new("x", "f", 10.0)];
        assert!(fit_block(&lines, f32::NAN, 10.0, &opts(), &CharWidth, &heights).is_err());
        assert!(fit_block(&lines, 10.0, -1.0, &opts(), &CharWidth, &heights).is_err());
        let bad = vec![Line::new("x", "f", 0.0)];
        assert!(fit_block(&bad, 10.0, 10.0, &opts(), &CharWidth, &heights).is_err());
        let bad_opts = FitOptions {
            shrink_ratio: 1.0,
            ..opts()
        };
        assert!(fit_block(&lines, 10.0, 10.0, &bad_opts, &CharWidth, &heights).is_err());
    }

    #[test]
    fn test_block_empty_input() {
        let heights = EstimatedMeasure::new();
        let out = fit_block(&[], 100.0, 100.0, &opts(), &CharWidth, &heights).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_refit_is_idempotent() {
        let heights = EstimatedMeasure::new();
        let lines = vec![
            Line::new("one", "f", 10.0).leading_ratio(0.125),
            Line::new("two", "f", 10.0).leading_ratio(0.125),
        ];
        let first = fit_block(&lines, 100.0, 100.0, &opts(), &CharWidth, &heights).unwrap();
        let second = fit_block(&first, 100.0, 100.0, &opts(), &CharWidth, &heights).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.size, b.size);
            assert_eq!(a.horizontal_scale, b.horizontal_scale);
        }
    }

    #[test]
    fn test_max_font_size() {
        // Width of "title" is 5 * size * 0.1 = size / 2.
        let size = max_font_size("title", "f", 20.0, 100.0, 6.0, 72.0, 0.0, &CharWidth);
        assert_eq!(size, 40.0);
        // Height-limited.
        let size = max_font_size("title", "f", 100.0, 12.0, 6.0, 72.0, 0.0, &CharWidth);
        assert_eq!(size, 12.0);
        // Nothing fits: floor wins.
        let size = max_font_size("a very long headline", "f", 2.0, 100.0, 6.0, 72.0, 0.0, &CharWidth);
        assert_eq!(size, 6.0);
    }
}
