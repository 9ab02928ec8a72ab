//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs
//!
//! These operators manage the graphics state stack and transformation matrix.
//! - q/Q: Push/pop graphics state
//! - cm: Concatenate transformation matrix
//! - w, J, j, M, d: Line styling (width, cap, join, miter limit, dash)
//! - ri, i: Rendering intent and flatness
//! - gs: Set parameters from graphics state dictionary
//!
//! Setters compare before writing; a change to anything the text style is
//! built from drops the cached style.

use smol_str::SmolStr;

use crate::error::Result;
use crate::geometry::Matrix;
use crate::interp::interpreter::PageInterpreter;
use crate::model::color::css_blend_mode;
use crate::model::objects::Operand;
use crate::model::state::{Dash, FontRef, LineCap, LineJoin};

#[allow(non_snake_case)]
impl PageInterpreter {
    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.gstack.push(self.gstate.clone());
    }

    /// Restores the graphics state from the stack. A restore without a
    /// matching save is ignored.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) {
        if let Some(state) = self.gstack.pop() {
            if state != self.gstate {
                self.text_style = None;
            }
            self.gstate = state;
        }
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let m = Matrix::new(a, b, c, d, e, f);
        if !m.is_identity() {
            self.gstate.ctm = m.multiply(&self.gstate.ctm);
            self.text_style = None;
        }
    }

    /// Sets the line width in user space.
    ///
    /// PDF operator: `w`
    pub fn do_w(&mut self, width: f64) {
        let width = width.abs();
        if self.gstate.line_width != width {
            self.gstate.line_width = width;
            self.text_style = None;
        }
    }

    /// Sets the line cap style. Unknown codes are ignored.
    ///
    /// PDF operator: `J`
    pub fn do_J(&mut self, code: i64) {
        if let Some(cap) = LineCap::from_code(code)
            && self.gstate.line_cap != cap
        {
            self.gstate.line_cap = cap;
        }
    }

    /// Sets the line join style. Unknown codes are ignored.
    ///
    /// PDF operator: `j`
    pub fn do_j(&mut self, code: i64) {
        if let Some(join) = LineJoin::from_code(code)
            && self.gstate.line_join != join
        {
            self.gstate.line_join = join;
        }
    }

    /// Sets the miter limit.
    ///
    /// PDF operator: `M`
    pub fn do_M(&mut self, limit: f64) {
        if self.gstate.miter_limit != limit {
            self.gstate.miter_limit = limit;
        }
    }

    /// Sets the line dash pattern.
    ///
    /// PDF operator: `d`
    pub fn do_d(&mut self, array: &[Operand], phase: f64) {
        let array: Vec<f64> = array.iter().filter_map(Operand::as_number).collect();
        self.set_dash(Dash { array, phase });
    }

    fn set_dash(&mut self, dash: Dash) {
        if self.gstate.dash != dash {
            self.gstate.dash = dash;
        }
    }

    /// Sets the color rendering intent.
    ///
    /// PDF operator: `ri`
    pub fn do_ri(&mut self, intent: &str) {
        if self.gstate.rendering_intent.as_deref() != Some(intent) {
            self.gstate.rendering_intent = Some(SmolStr::new(intent));
        }
    }

    /// Sets the flatness tolerance.
    ///
    /// PDF operator: `i`
    pub fn do_i(&mut self, flatness: f64) {
        if self.gstate.flatness != flatness {
            self.gstate.flatness = flatness;
        }
    }

    /// Applies a named graphics state parameter dictionary.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, name: &str) -> Result<()> {
        let Some(ext) = self.resources.ext_gstate(name) else {
            self.warn_once(format!("graphics state {} not found", name));
            return Ok(());
        };
        if let Some(width) = ext.line_width {
            self.do_w(width);
        }
        if let Some(code) = ext.line_cap {
            self.do_J(code);
        }
        if let Some(code) = ext.line_join {
            self.do_j(code);
        }
        if let Some(limit) = ext.miter_limit {
            self.do_M(limit);
        }
        if let Some((array, phase)) = ext.dash {
            self.set_dash(Dash { array, phase });
        }
        if let Some(alpha) = ext.fill_alpha
            && self.gstate.fill.alpha != alpha
        {
            self.gstate.fill.alpha = alpha.clamp(0.0, 1.0);
            self.text_style = None;
        }
        if let Some(alpha) = ext.stroke_alpha
            && self.gstate.stroke.alpha != alpha
        {
            self.gstate.stroke.alpha = alpha.clamp(0.0, 1.0);
            self.text_style = None;
        }
        if let Some(mode) = &ext.blend_mode {
            let mode = css_blend_mode(mode);
            if self.gstate.blend_mode != mode {
                self.gstate.blend_mode = mode;
            }
        }
        if let Some((font, size)) = ext.font {
            let font = Some(FontRef(font));
            let ts = &mut self.gstate.text;
            if ts.font != font || ts.font_size != size {
                ts.font = font;
                ts.font_size = size;
                self.text_style = None;
            }
        }
        match ext.soft_mask {
            Some(Some(mask)) => {
                self.gstate.soft_mask = self.render_soft_mask(&mask)?;
            }
            Some(None) => self.gstate.soft_mask = None,
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::geometry::Matrix;
    use crate::interp::interpreter::PageInterpreter;
    use crate::model::objects::Operand;
    use crate::model::resources::{ExtGState, MemoryResources};
    use crate::model::state::{Dash, LineCap};
    use crate::params::ConvertOptions;

    fn interpreter(resources: MemoryResources) -> PageInterpreter {
        PageInterpreter::new(
            Matrix::IDENTITY,
            100.0,
            100.0,
            Arc::new(resources),
            ConvertOptions::default(),
        )
    }

    #[test]
    fn test_save_restore() {
        let mut p = interpreter(MemoryResources::new());
        let before = p.gstate().clone();
        p.do_q();
        p.do_w(4.0);
        p.do_cm(2.0, 0.0, 0.0, 2.0, 5.0, 5.0);
        p.do_J(1);
        assert_ne!(p.gstate(), &before);
        p.do_Q();
        assert_eq!(p.gstate(), &before);
        // Unbalanced restore is a no-op.
        p.do_Q();
        assert_eq!(p.gstate(), &before);
    }

    #[test]
    fn test_cm_premultiplies() {
        let mut p = interpreter(MemoryResources::new());
        p.do_cm(1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
        p.do_cm(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        // The later matrix applies first.
        assert_eq!(p.gstate().ctm, Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 0.0));
    }

    #[test]
    fn test_gs_applies_parameters() {
        let ext = ExtGState {
            line_width: Some(3.0),
            line_cap: Some(2),
            fill_alpha: Some(0.5),
            blend_mode: Some("Multiply".into()),
            ..Default::default()
        };
        let mut p = interpreter(MemoryResources::new().with_ext_gstate("GS1", ext));
        p.do_gs("GS1").unwrap();
        assert_eq!(p.gstate().line_width, 3.0);
        assert_eq!(p.gstate().line_cap, LineCap::Square);
        assert_eq!(p.gstate().fill.alpha, 0.5);
        assert_eq!(p.gstate().blend_mode.as_deref(), Some("multiply"));
        // Missing dictionaries are ignored.
        p.do_gs("Missing").unwrap();
        assert_eq!(p.gstate().line_width, 3.0);
    }

    #[test]
    fn test_setters_ignore_invalid_and_repeated_values() {
        let mut p = interpreter(MemoryResources::new());
        p.do_J(7);
        p.do_j(-1);
        assert_eq!(p.gstate().line_cap, LineCap::Butt);
        p.do_ri("Perceptual");
        p.do_ri("Perceptual");
        assert_eq!(p.gstate().rendering_intent.as_deref(), Some("Perceptual"));
        p.do_d(&[Operand::Integer(3), Operand::Integer(1)], 2.0);
        assert_eq!(
            p.gstate().dash,
            Dash {
                array: vec![3.0, 1.0],
                phase: 2.0
            }
        );
    }

    #[test]
    fn test_unchanged_width_keeps_text_style() {
        let mut p = interpreter(MemoryResources::new());
        p.do_BT();
        p.do_Tr(1);
        p.do_Tj(b"a").unwrap();
        assert!(p.text_style.is_some());
        p.do_w(1.0);
        p.do_M(10.0);
        assert!(p.text_style.is_some());
        p.do_w(2.0);
        assert!(p.text_style.is_none());
    }
}
