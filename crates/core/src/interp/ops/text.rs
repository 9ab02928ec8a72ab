//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', ", d0, d1
//!
//! Text object:
//! - BT/ET: Begin/end text object
//!
//! Text state:
//! - Tc: Character spacing
//! - Tw: Word spacing
//! - Tz: Horizontal scaling
//! - TL: Leading
//! - Tf: Font and size
//! - Tr: Rendering mode
//! - Ts: Rise (baseline offset)
//!
//! Text positioning:
//! - Td/TD: Move to next line (TD also sets leading)
//! - Tm: Set text matrix directly
//! - T*: Move to next line using current leading
//!
//! Text showing:
//! - Tj: Show string
//! - TJ: Show with individual glyph positioning
//! - ': Move to next line and show
//! - ": Set spacing, move to next line, and show
//!
//! Type 3 glyph procedures:
//! - d0: Glyph width, colored glyph
//! - d1: Glyph width and bounding box, uncolored glyph (color operators ignored)
//!
//! Glyph runs go to the text layout engine; paragraphs are emitted when the
//! text object ends or before anything else is drawn.

use std::sync::{Arc, LazyLock};

use crate::error::Result;
use crate::geometry::{Matrix, Rectangle};
use crate::interp::interpreter::PageInterpreter;
use crate::interp::ops::pattern::PatternPaint;
use crate::layout::text::{TextParagraph, TextPart, TextStyle, paragraph_nodes};
use crate::model::objects::Operand;
use crate::model::resources::{FallbackFont, Font, ResourceKind, Type3Glyphs};
use crate::model::state::{FontRef, TextRenderMode, TextState};

/// Glyph space is y-up, output text is y-down.
const FLIP: Matrix = Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, 0.0);

static FALLBACK_FONT: LazyLock<Arc<dyn Font>> =
    LazyLock::new(|| Arc::new(FallbackFont::default()) as Arc<dyn Font>);

impl PageInterpreter {
    /// Resolves a font by name, falling back to a generic font.
    fn resolve_font(&mut self, name: &str) -> Arc<dyn Font> {
        let resources = self.resources.clone();
        let found = match (&self.cache, resources.resource_key(ResourceKind::Font, name)) {
            (Some(cache), Some(key)) => cache.font(key, || resources.font(name)),
            _ => resources.font(name),
        };
        found.unwrap_or_else(|| {
            self.warn_once(format!("font {} not found, using fallback", name));
            FALLBACK_FONT.clone()
        })
    }

    fn current_font(&self) -> Arc<dyn Font> {
        self.gstate
            .text
            .font
            .as_ref()
            .map_or_else(|| FALLBACK_FONT.clone(), |f| f.0.clone())
    }

    /// Text rendering matrix without font size and horizontal scaling.
    fn text_position_matrix(&self) -> Matrix {
        let ts = &self.gstate.text;
        FLIP.multiply(&Matrix::translation(0.0, ts.rise))
            .multiply(&ts.matrix)
            .multiply(&self.gstate.ctm)
    }

    /// Style of text drawn at `scale`, cached until a style input changes.
    fn text_style(&mut self, scale: f64) -> Arc<TextStyle> {
        if let Some((cached_scale, style)) = &self.text_style
            && *cached_scale == scale
        {
            return style.clone();
        }
        let font = self.current_font();
        let ts = &self.gstate.text;
        let mode = ts.render_mode;
        let font_size = (ts.font_size * scale).abs();
        let letter_spacing = ts.char_spacing * ts.scaling / 100.0 * scale;
        let scaling = ts.scaling;

        let (mut fill, mut fill_ref) = (None, None);
        if mode.fills() {
            let paint = self.gstate.fill.clone();
            match &paint.pattern {
                Some(name) => match self.pattern_ref(name, &paint, None) {
                    PatternPaint::Ref(id) => fill_ref = Some(id),
                    PatternPaint::Solid(rgb) => fill = Some((rgb, paint.alpha)),
                },
                None => fill = Some((paint.rgb, paint.alpha)),
            }
        }
        let stroke = mode.strokes().then(|| {
            let paint = &self.gstate.stroke;
            (paint.rgb, paint.alpha, self.stroke_width(false))
        });

        let style = Arc::new(TextStyle {
            font_family: font.family().into(),
            bold: font.bold(),
            italic: font.italic(),
            font_size,
            fill,
            fill_ref,
            stroke,
            letter_spacing,
            scaling,
            render_mode: mode,
        });
        self.text_style = Some((scale, style.clone()));
        style
    }

    /// Moves the text matrix by `dx` text space units.
    fn advance(&mut self, dx: f64) {
        let ts = &mut self.gstate.text;
        ts.matrix = Matrix::translation(dx, 0.0).multiply(&ts.matrix);
    }

    /// Shows a string with the current font.
    fn show_text(&mut self, bytes: &[u8]) -> Result<()> {
        let font = self.current_font();
        if let Some(glyphs) = font.type3() {
            return self.show_type3(&font, glyphs, bytes);
        }
        let ts = self.gstate.text.clone();
        let th = ts.scaling / 100.0;

        // Word spacing is not part of the glyph run: split after each space
        // so it turns into an offset between runs.
        let split = ts.word_spacing != 0.0 && font.word_spacing_applies();
        let pieces: Vec<&[u8]> = if split {
            bytes.split_inclusive(|b| *b == b' ').collect()
        } else {
            vec![bytes]
        };

        for piece in pieces {
            let decoded = font.decode(piece);
            let spacing = ts.char_spacing * decoded.glyph_count as f64;
            let glyph_advance = (decoded.width / 1000.0 * ts.font_size + spacing) * th;
            let spaces = if split {
                piece.iter().filter(|b| **b == b' ').count() as f64
            } else {
                0.0
            };

            let m = self.text_position_matrix();
            let scale = self.text.position(&m);
            let style = self.text_style(scale);
            self.text.add_text(&decoded.text, glyph_advance * scale, style);
            self.advance(glyph_advance + ts.word_spacing * spaces * th);
        }
        Ok(())
    }

    /// Renders Type 3 glyphs by running their procedures.
    fn show_type3(
        &mut self,
        font: &Arc<dyn Font>,
        glyphs: &Type3Glyphs,
        bytes: &[u8],
    ) -> Result<()> {
        let ts = self.gstate.text.clone();
        let th = ts.scaling / 100.0;
        let resources = glyphs
            .resources
            .clone()
            .unwrap_or_else(|| self.resources.clone());
        let mut nodes = Vec::new();

        for code in bytes {
            let decoded = font.decode(std::slice::from_ref(code));
            if let Some(proc) = glyphs.procs.get(code)
                && !ts.render_mode.is_invisible()
            {
                let text_space =
                    Matrix::new(ts.font_size * th, 0.0, 0.0, ts.font_size, 0.0, ts.rise);
                let ctm = glyphs
                    .font_matrix
                    .multiply(&text_space)
                    .multiply(&self.gstate.text.matrix)
                    .multiply(&self.gstate.ctm);
                let mut state = self.gstate.clone();
                state.ctm = ctm;
                state.text = TextState::default();
                let glyph = self.run_nested_or_skip(state, resources.clone(), proc, false)?;
                nodes.extend(glyph.into_iter().flatten());
            }
            let mut advance = decoded.width / 1000.0 * ts.font_size + ts.char_spacing;
            if *code == b' ' {
                advance += ts.word_spacing;
            }
            self.advance(advance * th);
        }
        self.text.add_type3(nodes);
        Ok(())
    }

    /// Emits the paragraphs collected so far.
    ///
    /// Visible and invisible text is drawn; text with a clipping render mode
    /// is kept for the clip applied at the end of the text object.
    pub(crate) fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        for paragraph in self.text.take() {
            if paragraph.type3.is_some() {
                let glyphs =
                    paragraph_nodes(&paragraph, TextPart::Visible, &self.options, &mut self.defs);
                for node in glyphs {
                    self.push_raw(node);
                }
                continue;
            }
            let bounds = paragraph_bounds(&paragraph);
            let mut parts = vec![TextPart::Visible];
            if self.options.include_hidden_text {
                parts.push(TextPart::Invisible);
            }
            for part in parts {
                for node in paragraph_nodes(&paragraph, part, &self.options, &mut self.defs) {
                    self.append(node, bounds);
                }
            }
            let clip = paragraph_nodes(&paragraph, TextPart::Clip, &self.options, &mut self.defs);
            self.text_clip.extend(clip);
        }
    }
}

/// Approximate device-space extent of a paragraph.
fn paragraph_bounds(p: &TextParagraph) -> Option<Rectangle> {
    let size = p.spans.iter().map(|s| s.style.font_size).fold(0.0, f64::max);
    let width: f64 = p.spans.iter().map(|s| s.extent()).sum();
    Rectangle::new(p.x, p.y - size, p.x + width, p.y + size)
        .to_path()
        .transform(&p.transform)
        .bounds()
}

#[allow(non_snake_case)]
impl PageInterpreter {
    // ========================================================================
    // Text Object Operators
    // ========================================================================

    /// BT - Begin text object.
    ///
    /// Initializes the text matrix (Tm) and text line matrix (Tlm) to identity.
    pub fn do_BT(&mut self) {
        self.in_text = true;
        self.gstate.text.reset();
    }

    /// ET - End text object.
    ///
    /// Emits pending text and intersects the clip with text drawn in a
    /// clipping render mode.
    pub fn do_ET(&mut self) {
        self.in_text = false;
        self.flush_text();
        if !self.text_clip.is_empty() {
            let outlines = std::mem::take(&mut self.text_clip);
            self.gstate.clip = Some(self.clips.intersect_text(self.gstate.clip, outlines));
        }
    }

    // ========================================================================
    // Text State Operators
    // ========================================================================

    /// Tc - Set character spacing.
    pub fn do_Tc(&mut self, spacing: f64) {
        if self.gstate.text.char_spacing != spacing {
            self.gstate.text.char_spacing = spacing;
            self.text_style = None;
        }
    }

    /// Tw - Set word spacing.
    pub fn do_Tw(&mut self, spacing: f64) {
        if self.gstate.text.word_spacing != spacing {
            self.gstate.text.word_spacing = spacing;
        }
    }

    /// Tz - Set horizontal scaling (percentage).
    pub fn do_Tz(&mut self, scaling: f64) {
        if self.gstate.text.scaling != scaling {
            self.gstate.text.scaling = scaling;
            self.text_style = None;
        }
    }

    /// TL - Set text leading.
    pub fn do_TL(&mut self, leading: f64) {
        if self.gstate.text.leading != leading {
            self.gstate.text.leading = leading;
        }
    }

    /// Tf - Set font and size.
    pub fn do_Tf(&mut self, name: &str, size: f64) {
        let font = FontRef(self.resolve_font(name));
        let ts = &mut self.gstate.text;
        if ts.font.as_ref() != Some(&font) || ts.font_size != size {
            ts.font = Some(font);
            ts.font_size = size;
            self.text_style = None;
        }
        if ts.font_name.as_deref() != Some(name) {
            ts.font_name = Some(name.into());
        }
    }

    /// Tr - Set text rendering mode. Unknown modes are ignored.
    pub fn do_Tr(&mut self, mode: i64) {
        if let Some(mode) = TextRenderMode::from_code(mode)
            && self.gstate.text.render_mode != mode
        {
            self.gstate.text.render_mode = mode;
            self.text_style = None;
        }
    }

    /// Ts - Set text rise.
    pub fn do_Ts(&mut self, rise: f64) {
        if self.gstate.text.rise != rise {
            self.gstate.text.rise = rise;
        }
    }

    // ========================================================================
    // Text Positioning Operators
    // ========================================================================

    /// Td - Move to the start of the next line, offset by (tx, ty).
    pub fn do_Td(&mut self, tx: f64, ty: f64) {
        let ts = &mut self.gstate.text;
        ts.line_matrix = Matrix::translation(tx, ty).multiply(&ts.line_matrix);
        ts.matrix = ts.line_matrix;
    }

    /// TD - Move to the next line and set leading to -ty.
    pub fn do_TD(&mut self, tx: f64, ty: f64) {
        self.gstate.text.leading = -ty;
        self.do_Td(tx, ty);
    }

    /// Tm - Set text matrix and text line matrix.
    pub fn do_Tm(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let ts = &mut self.gstate.text;
        ts.matrix = Matrix::new(a, b, c, d, e, f);
        ts.line_matrix = ts.matrix;
    }

    /// T* - Move to start of next line using the current leading.
    pub fn do_T_star(&mut self) {
        let leading = self.gstate.text.leading;
        self.do_Td(0.0, -leading);
    }

    // ========================================================================
    // Text Showing Operators
    // ========================================================================

    /// TJ - Show strings with individual glyph positioning.
    ///
    /// Numbers move the next glyph left by thousandths of a text space unit.
    pub fn do_TJ(&mut self, items: &[Operand]) -> Result<()> {
        for item in items {
            match item {
                Operand::Str(bytes) => self.show_text(bytes)?,
                other => {
                    if let Some(n) = other.as_number() {
                        let ts = &self.gstate.text;
                        let dx = -n / 1000.0 * ts.font_size * ts.scaling / 100.0;
                        self.advance(dx);
                    }
                }
            }
        }
        Ok(())
    }

    /// Tj - Show a text string.
    pub fn do_Tj(&mut self, bytes: &[u8]) -> Result<()> {
        self.show_text(bytes)
    }

    /// ' - Move to next line and show text.
    pub fn do_quote(&mut self, bytes: &[u8]) -> Result<()> {
        self.do_T_star();
        self.show_text(bytes)
    }

    /// " - Set word and character spacing, move to next line, and show text.
    pub fn do_doublequote(&mut self, aw: f64, ac: f64, bytes: &[u8]) -> Result<()> {
        self.do_Tw(aw);
        self.do_Tc(ac);
        self.do_quote(bytes)
    }

    // ========================================================================
    // Type 3 Glyph Operators
    // ========================================================================

    /// d0 - Glyph width of a colored Type 3 glyph. Widths come from the font.
    pub fn do_d0(&mut self, _wx: f64, _wy: f64) {}

    /// d1 - Glyph width and bounding box of an uncolored Type 3 glyph; the
    /// glyph is painted with the color current at the text operator.
    pub fn do_d1(&mut self) {
        self.color_locked = true;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::geometry::Matrix;
    use crate::interp::interpreter::PageInterpreter;
    use crate::model::objects::Operand;
    use crate::model::resources::{FallbackFont, MemoryResources};
    use crate::params::ConvertOptions;

    fn interpreter() -> PageInterpreter {
        let font = Arc::new(FallbackFont::new("serif", 500.0));
        let resources = MemoryResources::new().with_font("F1", font);
        PageInterpreter::new(
            Matrix::IDENTITY,
            500.0,
            500.0,
            Arc::new(resources),
            ConvertOptions::default(),
        )
    }

    #[test]
    fn test_tj_advances_text_matrix() {
        let mut p = interpreter();
        p.do_BT();
        p.do_Tf("F1", 10.0);
        p.do_Td(100.0, 200.0);
        p.do_Tj(b"ab").unwrap();
        // Two glyphs of 500/1000 em at size 10.
        assert_eq!(p.gstate().text.matrix.e, 110.0);
        p.do_ET();
        let text = &p.content()[0];
        assert_eq!(text.tag, "text");
        assert_eq!(text.text.as_deref(), Some("ab"));
        assert_eq!(text.get_attr("x"), Some("100"));
        assert_eq!(text.get_attr("y"), Some("-200"));
    }

    #[test]
    fn test_tj_kerning_becomes_offset() {
        let mut p = interpreter();
        p.do_BT();
        p.do_Tf("F1", 10.0);
        p.do_TJ(&[
            Operand::Str(b"a".to_vec()),
            Operand::Integer(-500),
            Operand::Str(b"b".to_vec()),
        ])
        .unwrap();
        p.do_ET();
        let text = &p.content()[0];
        assert_eq!(text.text.as_deref(), Some("ab"));
        assert_eq!(text.get_attr("dx"), Some("0 5"));
    }

    #[test]
    fn test_word_spacing_split() {
        let mut p = interpreter();
        p.do_BT();
        p.do_Tf("F1", 10.0);
        p.do_Tw(2.0);
        p.do_Tj(b"a b").unwrap();
        // 3 glyphs plus one word space.
        assert_eq!(p.gstate().text.matrix.e, 17.0);
        p.do_ET();
        assert_eq!(p.content()[0].get_attr("dx"), Some("0 0 2"));
    }

    #[test]
    fn test_missing_font_falls_back() {
        let mut p = interpreter();
        p.do_BT();
        p.do_Tf("F9", 12.0);
        p.do_Tj(b"x").unwrap();
        p.do_ET();
        assert_eq!(p.content().len(), 1);
    }

    #[test]
    fn test_clip_mode_text_clips() {
        let mut p = interpreter();
        p.do_BT();
        p.do_Tf("F1", 10.0);
        p.do_Tr(7);
        p.do_Tj(b"clip").unwrap();
        p.do_ET();
        assert!(p.content().is_empty());
        assert!(p.gstate().clip.is_some());
    }
}
