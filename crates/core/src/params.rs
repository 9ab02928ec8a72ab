//! Conversion parameters.
//!
//! Contains `ConvertOptions`, the tuning knobs of the interpreter, the text
//! layout engine and the attribute optimizer.

use crate::error::{FolioError, Result};

/// Parameters for converting a content stream into a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Width used for strokes declared with width 0 (thinnest line), and the
    /// lower bound for any emitted stroke width. In device units.
    pub min_stroke_width: f64,

    /// Number of decimal places kept in emitted coordinates.
    pub precision: usize,

    /// If the horizontal distance between the end of the previous text run and
    /// the next text position is below this value (device units), and the
    /// line is otherwise continuous, the run continues the open paragraph.
    pub text_merge_distance: f64,

    /// Spaces between runs smaller than this fraction of the font size are
    /// treated as kerning noise and dropped.
    pub merge_space_em: f64,

    /// Spaces between runs smaller than this absolute amount (device units)
    /// are treated as kerning noise and dropped.
    pub min_space_px: f64,

    /// Emit invisible (render mode 3) text as transparent text.
    pub include_hidden_text: bool,

    /// Maximum recursion depth for forms, patterns, masks and glyph procedures.
    pub max_nesting_depth: usize,

    /// Run the attribute optimizer over the finished tree.
    pub optimize_attributes: bool,

    /// Minimum number of consecutive identically styled siblings that are
    /// grouped by the attribute optimizer.
    pub min_group_run: usize,

    /// Skip clip wrappers for content fully inside an un-nested rectangle clip.
    pub rect_clip_fast_path: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            min_stroke_width: 0.5,
            precision: 3,
            text_merge_distance: 20.0,
            merge_space_em: 0.02,
            min_space_px: 0.1,
            include_hidden_text: true,
            max_nesting_depth: 24,
            optimize_attributes: true,
            min_group_run: 3,
            rect_clip_fast_path: true,
        }
    }
}

impl ConvertOptions {
    /// Validates the options, returning them unchanged when consistent.
    pub fn validated(self) -> Result<Self> {
        if !(self.min_stroke_width > 0.0) {
            return Err(FolioError::InvalidOption(
                "min_stroke_width must be positive".into(),
            ));
        }
        if self.precision > 10 {
            return Err(FolioError::InvalidOption(
                "precision must be at most 10 decimal places".into(),
            ));
        }
        if self.text_merge_distance < 0.0 || self.merge_space_em < 0.0 || self.min_space_px < 0.0 {
            return Err(FolioError::InvalidOption(
                "text merge thresholds must not be negative".into(),
            ));
        }
        if self.max_nesting_depth == 0 {
            return Err(FolioError::InvalidOption(
                "max_nesting_depth must be at least 1".into(),
            ));
        }
        if self.min_group_run < 2 {
            return Err(FolioError::InvalidOption(
                "min_group_run must be at least 2".into(),
            ));
        }
        Ok(self)
    }

    /// Rounds a coordinate to the configured precision.
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.precision as i32);
        let rounded = (value * factor).round() / factor;
        // Avoid emitting "-0"
        if rounded == 0.0 { 0.0 } else { rounded }
    }

    /// Formats a number at the configured precision without trailing zeros.
    pub fn fmt(&self, value: f64) -> String {
        format_number(self.round(value), self.precision)
    }
}

/// Formats a number with at most `precision` decimals, trimming trailing zeros.
pub fn format_number(value: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
