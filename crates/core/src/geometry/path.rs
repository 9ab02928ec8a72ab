//! Path model.
//!
//! A [`Path`] is an ordered list of segments in a single coordinate space.
//! Transforming a path produces a new path; the content stream interpreter
//! accumulates user-space segments and maps them to device space once, when
//! the path is painted or used for clipping.

use smallvec::SmallVec;

use super::matrix::Matrix;
use super::rect::Rectangle;

/// Path segment for graphics operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(f64, f64),
    /// Line to point (x, y)
    LineTo(f64, f64),
    /// Cubic bezier curve (x1, y1, x2, y2, x3, y3)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Close path
    ClosePath,
}

impl PathSegment {
    /// Maps every coordinate of the segment through `m`.
    pub fn transform(&self, m: &Matrix) -> PathSegment {
        match *self {
            PathSegment::MoveTo(x, y) => {
                let (x, y) = m.transform_point(x, y);
                PathSegment::MoveTo(x, y)
            }
            PathSegment::LineTo(x, y) => {
                let (x, y) = m.transform_point(x, y);
                PathSegment::LineTo(x, y)
            }
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                let (x1, y1) = m.transform_point(x1, y1);
                let (x2, y2) = m.transform_point(x2, y2);
                let (x3, y3) = m.transform_point(x3, y3);
                PathSegment::CurveTo(x1, y1, x2, y2, x3, y3)
            }
            PathSegment::ClosePath => PathSegment::ClosePath,
        }
    }

    /// Points carried by the segment (end point last).
    fn points(&self) -> SmallVec<[(f64, f64); 3]> {
        match *self {
            PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => {
                SmallVec::from_slice(&[(x, y)])
            }
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                SmallVec::from_slice(&[(x1, y1), (x2, y2), (x3, y3)])
            }
            PathSegment::ClosePath => SmallVec::new(),
        }
    }
}

/// An ordered sequence of path segments in one coordinate space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Removes all segments, returning them as a new path.
    pub fn take(&mut self) -> Path {
        Path {
            segments: std::mem::take(&mut self.segments),
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::MoveTo(x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::LineTo(x, y));
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.segments
            .push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::ClosePath);
    }

    /// Appends a rectangle as a complete subpath.
    ///
    /// Equivalent to: m x y; l x+w y; l x+w y+h; l x y+h; h
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close();
    }

    /// Current point: the end of the last segment, or the start of the current
    /// subpath after a close.
    pub fn current_point(&self) -> Option<(f64, f64)> {
        let mut start = None;
        let mut current = None;
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(x, y) => {
                    start = Some((x, y));
                    current = start;
                }
                PathSegment::LineTo(x, y) | PathSegment::CurveTo(_, _, _, _, x, y) => {
                    current = Some((x, y));
                }
                PathSegment::ClosePath => current = start,
            }
        }
        current
    }

    /// Returns a new path with every coordinate mapped through `m`.
    pub fn transform(&self, m: &Matrix) -> Path {
        Path {
            segments: self.segments.iter().map(|s| s.transform(m)).collect(),
        }
    }

    /// Bounding box of all points including curve control points.
    pub fn bounds(&self) -> Option<Rectangle> {
        let mut bounds: Option<Rectangle> = None;
        for seg in &self.segments {
            for (x, y) in seg.points() {
                bounds = Some(match bounds {
                    Some(r) => r.include_point(x, y),
                    None => Rectangle::new(x, y, x, y),
                });
            }
        }
        bounds
    }

    /// Formats the path as SVG path data.
    ///
    /// Coordinates are converted to fixed point at `precision` decimals
    /// before relative offsets are computed, so rounding errors do not
    /// accumulate along the path. Each command is written in absolute or
    /// relative form, whichever is shorter.
    pub fn to_data(&self, precision: usize) -> String {
        let mut w = PathDataWriter::new(precision);
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(x, y) => w.move_to(x, y),
                PathSegment::LineTo(x, y) => w.line_to(x, y),
                PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => w.curve_to(x1, y1, x2, y2, x3, y3),
                PathSegment::ClosePath => w.close(),
            }
        }
        w.finish()
    }
}

/// Fixed-point SVG path data writer.
struct PathDataWriter {
    out: String,
    factor: f64,
    precision: usize,
    current: (i64, i64),
    subpath_start: (i64, i64),
    has_point: bool,
}

impl PathDataWriter {
    fn new(precision: usize) -> Self {
        Self {
            out: String::new(),
            factor: 10f64.powi(precision as i32),
            precision,
            current: (0, 0),
            subpath_start: (0, 0),
            has_point: false,
        }
    }

    fn fixed(&self, v: f64) -> i64 {
        (v * self.factor).round() as i64
    }

    fn num(&self, n: i64) -> String {
        format_fixed(n, self.precision)
    }

    /// Joins numbers, omitting the separator before a minus sign.
    fn join(&self, values: &[i64]) -> String {
        let mut s = String::new();
        for (i, v) in values.iter().enumerate() {
            let n = self.num(*v);
            if i > 0 && !n.starts_with('-') {
                s.push(' ');
            }
            s.push_str(&n);
        }
        s
    }

    fn emit(&mut self, abs_cmd: char, abs: &[i64], rel_cmd: char, rel: &[i64]) {
        let a = self.join(abs);
        let r = self.join(rel);
        if self.has_point && r.len() < a.len() {
            self.out.push(rel_cmd);
            self.out.push_str(&r);
        } else {
            self.out.push(abs_cmd);
            self.out.push_str(&a);
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = (self.fixed(x), self.fixed(y));
        let (cx, cy) = self.current;
        self.emit('M', &[p.0, p.1], 'm', &[p.0 - cx, p.1 - cy]);
        self.current = p;
        self.subpath_start = p;
        self.has_point = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = (self.fixed(x), self.fixed(y));
        let (cx, cy) = self.current;
        if !self.has_point {
            self.move_to(x, y);
            return;
        }
        if p.1 == cy && p.0 != cx {
            self.emit('H', &[p.0], 'h', &[p.0 - cx]);
        } else if p.0 == cx && p.1 != cy {
            self.emit('V', &[p.1], 'v', &[p.1 - cy]);
        } else {
            self.emit('L', &[p.0, p.1], 'l', &[p.0 - cx, p.1 - cy]);
        }
        self.current = p;
    }

    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        if !self.has_point {
            self.move_to(x1, y1);
        }
        let p1 = (self.fixed(x1), self.fixed(y1));
        let p2 = (self.fixed(x2), self.fixed(y2));
        let p3 = (self.fixed(x3), self.fixed(y3));
        let (cx, cy) = self.current;
        self.emit(
            'C',
            &[p1.0, p1.1, p2.0, p2.1, p3.0, p3.1],
            'c',
            &[
                p1.0 - cx,
                p1.1 - cy,
                p2.0 - cx,
                p2.1 - cy,
                p3.0 - cx,
                p3.1 - cy,
            ],
        );
        self.current = p3;
    }

    fn close(&mut self) {
        if self.has_point {
            self.out.push('Z');
            self.current = self.subpath_start;
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Formats a fixed-point integer with `precision` implied decimals.
pub(crate) fn format_fixed(n: i64, precision: usize) -> String {
    if precision == 0 {
        return n.to_string();
    }
    let negative = n < 0;
    let abs = n.unsigned_abs();
    let factor = 10u64.pow(precision as u32);
    let int_part = abs / factor;
    let frac_part = abs % factor;
    let mut s = String::new();
    if negative && abs != 0 {
        s.push('-');
    }
    s.push_str(&int_part.to_string());
    if frac_part != 0 {
        let mut frac = format!("{:0width$}", frac_part, width = precision);
        while frac.ends_with('0') {
            frac.pop();
        }
        s.push('.');
        s.push_str(&frac);
    }
    s
}
