//! cardtext - Text Fitting Engine
//!
//! This crate lays out logical text lines (titles, track entries, metadata
//! columns) into a fixed rectangular region on a printable card panel:
//! - Font registry and matching (fontdb)
//! - Glyph ink-height measurement via shaping (rustybuzz + ttf-parser)
//! - Per-line fitting (horizontal compression, word splitting, truncation)
//! - Block fitting (iterative global font-size reduction)
//! - Canonical rendering through an abstract drawing surface
//!
//! "Does not fit" is never an error: the fitter returns a best-effort layout
//! (possibly compressed, split, truncated, or still overflowing). Errors are
//! reserved for programmer mistakes such as non-finite bounds.

pub mod fit;
pub mod font;
pub mod line;
pub mod measure;
pub mod render;

pub use fit::{FitOptions, fit_block, fit_line, max_font_size};
pub use font::FontRegistry;
pub use line::{Bounds, Line, Payload, Segment, block_height};
pub use measure::{EstimatedMeasure, HeightMeasure, ShapedMeasurer, TextMeasure};
pub use render::{Align, DrawSurface, VAlign, render};

/// Layout error types
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("failed to parse font: {0}")]
    FontParsing(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
