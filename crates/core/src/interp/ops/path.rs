//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*
//!
//! Path construction:
//! - m: Move to
//! - l: Line to
//! - c, v, y: Bezier curves (cubic variants)
//! - h: Close subpath
//! - re: Rectangle shorthand
//!
//! Path painting:
//! - S/s: Stroke (s closes first)
//! - f/F/f*: Fill (F is legacy, f* uses even-odd rule)
//! - B/B*/b/b*: Fill then stroke
//! - n: End path (no-op, often with clipping)
//!
//! Clipping:
//! - W/W*: Set clipping path (non-zero/even-odd), applied after the next
//!   painting operator

use std::f64::consts::SQRT_2;

use crate::geometry::{Matrix, Path, Rectangle};
use crate::interp::interpreter::PageInterpreter;
use crate::layout::text::matrix_attr;
use crate::model::state::LineJoin;
use crate::output::node::Node;

impl PageInterpreter {
    /// Paints the current path, applies any pending clip and starts a new
    /// path.
    fn paint_path(&mut self, stroke: bool, fill: bool, even_odd: bool) {
        let path = self.curpath.take();
        let clip = self.pending_clip.take();
        if (stroke || fill) && !path.is_empty() {
            self.flush_text();
            self.draw_path(&path, stroke, fill, even_odd);
        }
        if let Some(clip_even_odd) = clip {
            let device = path.transform(&self.gstate.ctm);
            self.gstate.clip = Some(self.clips.intersect(self.gstate.clip, &device, clip_even_odd));
        }
    }

    /// Emits a user-space path with the current paint.
    pub(crate) fn draw_path(&mut self, path: &Path, stroke: bool, fill: bool, even_odd: bool) {
        let ctm = self.gstate.ctm;
        let mut device = path.transform(&ctm);
        let Some(mut bounds) = device.bounds() else {
            return;
        };

        // Non-uniform strokes keep their user-space geometry so the pen
        // is distorted like the path.
        let user_space = stroke && !ctm.is_uniform();

        if fill
            && !stroke
            && self.options.rect_clip_fast_path
            && let Some(clip) = self.gstate.clip
            && let Some(clip_rect) = self.clips.unnested_rect(clip)
            && let Some(rect) = Rectangle::from_path(&device)
        {
            match rect.intersect(&clip_rect) {
                Some(visible) => {
                    device = visible.to_path();
                    bounds = visible;
                }
                None => {
                    tracing::trace!("fill outside clip rectangle dropped");
                    return;
                }
            }
        }

        let mut node = if user_space {
            let o = &self.options;
            Node::new("path")
                .attr("d", path.to_data(o.precision))
                .attr("transform", matrix_attr(&ctm, o))
        } else {
            self.shape_node(&device, stroke)
        };
        let node_transform = user_space.then_some(ctm);

        if fill {
            self.apply_fill(&mut node, even_odd, node_transform.as_ref());
        } else {
            node.set_attr("fill", "none");
        }
        if stroke {
            self.apply_stroke(&mut node, node_transform.as_ref());
            bounds = bounds.inflate(self.stroke_extent(&ctm));
        }
        self.append(node, Some(bounds));
    }

    /// Distance the stroke may reach beyond the path, in device space.
    fn stroke_extent(&self, ctm: &Matrix) -> f64 {
        let scale = ctm.a.hypot(ctm.b).max(ctm.c.hypot(ctm.d));
        let half = (self.gstate.line_width * scale).max(self.options.min_stroke_width) / 2.0;
        match self.gstate.line_join {
            LineJoin::Miter => half * self.gstate.miter_limit.max(SQRT_2),
            _ => half * SQRT_2,
        }
    }
}

#[allow(non_snake_case)]
impl PageInterpreter {
    // ========================================================================
    // Path Construction Operators
    // ========================================================================

    /// Begins a new subpath at the given point.
    ///
    /// PDF operator: `m`
    pub fn do_m(&mut self, x: f64, y: f64) {
        self.curpath.move_to(x, y);
    }

    /// Appends a straight line segment from the current point. Without a
    /// current point the line starts a new subpath.
    ///
    /// PDF operator: `l`
    pub fn do_l(&mut self, x: f64, y: f64) {
        if self.curpath.is_empty() {
            self.curpath.move_to(x, y);
        } else {
            self.curpath.line_to(x, y);
        }
    }

    /// Appends a cubic Bezier curve to the path.
    ///
    /// The curve extends from the current point to (x3, y3),
    /// using (x1, y1) and (x2, y2) as control points.
    ///
    /// PDF operator: `c`
    pub fn do_c(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        if self.curpath.is_empty() {
            self.curpath.move_to(x1, y1);
        }
        self.curpath.curve_to(x1, y1, x2, y2, x3, y3);
    }

    /// Appends a cubic Bezier curve with the current point as first control point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        match self.curpath.current_point() {
            Some((x1, y1)) => self.curpath.curve_to(x1, y1, x2, y2, x3, y3),
            None => tracing::trace!("curve without current point skipped"),
        }
    }

    /// Appends a cubic Bezier curve with the end point as second control point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        if self.curpath.is_empty() {
            self.curpath.move_to(x1, y1);
        }
        self.curpath.curve_to(x1, y1, x3, y3, x3, y3);
    }

    /// Closes the current subpath.
    ///
    /// PDF operator: `h`
    pub fn do_h(&mut self) {
        if !self.curpath.is_empty() {
            self.curpath.close();
        }
    }

    /// Appends a rectangle as a complete subpath.
    ///
    /// PDF operator: `re`
    pub fn do_re(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.curpath.rect(x, y, w, h);
    }

    // ========================================================================
    // Path Painting Operators
    // ========================================================================

    /// Strokes the current path.
    ///
    /// PDF operator: `S`
    pub fn do_S(&mut self) {
        self.paint_path(true, false, false);
    }

    /// Closes and strokes the current path.
    ///
    /// PDF operator: `s`
    pub fn do_s(&mut self) {
        self.do_h();
        self.do_S();
    }

    /// Fills the current path using the nonzero winding rule.
    ///
    /// PDF operator: `f`
    pub fn do_f(&mut self) {
        self.paint_path(false, true, false);
    }

    /// Fills the current path (obsolete equivalent of `f`).
    ///
    /// PDF operator: `F`
    pub fn do_F(&mut self) {
        self.do_f();
    }

    /// Fills the current path using the even-odd rule.
    ///
    /// PDF operator: `f*`
    pub fn do_f_star(&mut self) {
        self.paint_path(false, true, true);
    }

    /// Fills and strokes the current path.
    ///
    /// PDF operator: `B`
    pub fn do_B(&mut self) {
        self.paint_path(true, true, false);
    }

    /// Fills (even-odd) and strokes the current path.
    ///
    /// PDF operator: `B*`
    pub fn do_B_star(&mut self) {
        self.paint_path(true, true, true);
    }

    /// Closes, fills and strokes the current path.
    ///
    /// PDF operator: `b`
    pub fn do_b(&mut self) {
        self.do_h();
        self.do_B();
    }

    /// Closes, fills (even-odd) and strokes the current path.
    ///
    /// PDF operator: `b*`
    pub fn do_b_star(&mut self) {
        self.do_h();
        self.do_B_star();
    }

    /// Ends the path without painting; completes a pending clip.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) {
        self.paint_path(false, false, false);
    }

    // ========================================================================
    // Clipping Operators
    // ========================================================================

    /// Marks the current path for clipping (nonzero winding rule).
    ///
    /// PDF operator: `W`
    pub fn do_W(&mut self) {
        self.pending_clip = Some(false);
    }

    /// Marks the current path for clipping (even-odd rule).
    ///
    /// PDF operator: `W*`
    pub fn do_W_star(&mut self) {
        self.pending_clip = Some(true);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::geometry::Matrix;
    use crate::interp::interpreter::PageInterpreter;
    use crate::model::resources::MemoryResources;
    use crate::params::ConvertOptions;

    fn interpreter(ctm: Matrix) -> PageInterpreter {
        PageInterpreter::new(
            ctm,
            200.0,
            200.0,
            Arc::new(MemoryResources::new()),
            ConvertOptions::default(),
        )
    }

    #[test]
    fn test_re_fill_emits_rect() {
        let mut p = interpreter(Matrix::IDENTITY);
        p.do_re(10.0, 20.0, 30.0, 40.0);
        p.do_f();
        assert!(p.current_path().is_empty());
        let nodes = p.content();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag, "rect");
        assert_eq!(nodes[0].get_attr("width"), Some("30"));
        assert!(!nodes[0].has_attr("fill"));
    }

    #[test]
    fn test_stroke_width_scaled_under_uniform_ctm() {
        let mut p = interpreter(Matrix::scaling(2.0, 2.0));
        p.do_w(3.0);
        p.do_m(0.0, 0.0);
        p.do_l(10.0, 5.0);
        p.do_S();
        let node = &p.content()[0];
        assert_eq!(node.tag, "path");
        assert_eq!(node.get_attr("stroke-width"), Some("6"));
        assert_eq!(node.get_attr("fill"), Some("none"));
        assert!(!node.has_attr("transform"));
    }

    #[test]
    fn test_non_uniform_stroke_keeps_user_space() {
        let mut p = interpreter(Matrix::scaling(2.0, 1.0));
        p.do_w(3.0);
        p.do_m(0.0, 0.0);
        p.do_l(10.0, 5.0);
        p.do_S();
        let node = &p.content()[0];
        assert_eq!(node.get_attr("stroke-width"), Some("3"));
        assert_eq!(node.get_attr("transform"), Some("matrix(2 0 0 1 0 0)"));
    }

    #[test]
    fn test_zero_width_stroke_uses_minimum() {
        let mut p = interpreter(Matrix::IDENTITY);
        p.do_w(0.0);
        p.do_m(0.0, 0.0);
        p.do_l(10.0, 5.0);
        p.do_S();
        assert_eq!(p.content()[0].get_attr("stroke-width"), Some("0.5"));
    }

    #[test]
    fn test_clip_applies_after_paint() {
        let mut p = interpreter(Matrix::IDENTITY);
        p.do_re(0.0, 0.0, 50.0, 50.0);
        p.do_W();
        p.do_f();
        // The painting operator itself is not clipped.
        assert_eq!(p.content()[0].tag, "rect");
        assert!(p.gstate().clip.is_some());
    }

    #[test]
    fn test_fill_outside_clip_dropped() {
        let mut p = interpreter(Matrix::IDENTITY);
        p.do_re(0.0, 0.0, 50.0, 50.0);
        p.do_W();
        p.do_n();
        p.do_re(60.0, 60.0, 10.0, 10.0);
        p.do_f();
        assert!(p.content().is_empty());
        p.do_re(40.0, 40.0, 20.0, 20.0);
        p.do_f();
        let node = &p.content()[0];
        assert_eq!(node.tag, "rect");
        assert_eq!(node.get_attr("width"), Some("10"));
    }

    fn open_u(p: &mut PageInterpreter) {
        p.do_m(0.0, 0.0);
        p.do_l(100.0, 0.0);
        p.do_l(100.0, 100.0);
        p.do_l(0.0, 100.0);
    }

    #[test]
    fn test_open_corner_path_stroked_as_path() {
        let mut p = interpreter(Matrix::IDENTITY);
        open_u(&mut p);
        p.do_S();
        let node = &p.content()[0];
        assert_eq!(node.tag, "path");
        assert!(node.get_attr("d").is_some_and(|d| !d.ends_with('Z')));

        // Fill and stroke of the same open path draws the outline open too.
        open_u(&mut p);
        p.do_B();
        assert_eq!(p.content()[1].tag, "path");

        // Returning to the first corner without closing still has two ends.
        open_u(&mut p);
        p.do_l(0.0, 0.0);
        p.do_S();
        assert_eq!(p.content()[2].tag, "path");
    }

    #[test]
    fn test_closed_corner_path_stroked_as_rect() {
        let mut p = interpreter(Matrix::IDENTITY);
        open_u(&mut p);
        p.do_s();
        assert_eq!(p.content()[0].tag, "rect");
        p.do_re(0.0, 0.0, 10.0, 10.0);
        p.do_S();
        assert_eq!(p.content()[1].tag, "rect");
        // Fills close implicitly.
        open_u(&mut p);
        p.do_f();
        assert_eq!(p.content()[2].tag, "rect");
    }
}
