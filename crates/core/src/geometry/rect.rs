//! Axis-aligned rectangles and rectangle recognition.

use super::path::{Path, PathSegment};

/// Normalized axis-aligned rectangle (`x1 <= x2`, `y1 <= y2`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rectangle {
    /// Creates a rectangle from two corners in any order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Intersection, or `None` when the rectangles do not overlap.
    pub fn intersect(&self, other: &Rectangle) -> Option<Rectangle> {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        if x1 > x2 || y1 > y2 {
            None
        } else {
            Some(Rectangle { x1, y1, x2, y2 })
        }
    }

    /// True when `other` lies entirely inside `self` (edges may touch).
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    pub fn include_point(&self, x: f64, y: f64) -> Rectangle {
        Rectangle {
            x1: self.x1.min(x),
            y1: self.y1.min(y),
            x2: self.x2.max(x),
            y2: self.y2.max(y),
        }
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: f64) -> Rectangle {
        Rectangle::new(
            self.x1 - amount,
            self.y1 - amount,
            self.x2 + amount,
            self.y2 + amount,
        )
    }

    /// The rectangle as a closed path: m x1 y1, l x2 y1, l x2 y2, l x1 y2, h.
    pub fn to_path(&self) -> Path {
        let mut p = Path::new();
        p.rect(self.x1, self.y1, self.width(), self.height());
        p
    }

    /// Recognizes a path that is exactly one axis-aligned rectangle.
    ///
    /// Accepts a single subpath of four corners, starting at any corner and
    /// running in either direction, optionally repeating the first corner and
    /// optionally closed. Edges must alternate strictly between horizontal and
    /// vertical, and the corners must span exactly two distinct x values and
    /// two distinct y values.
    pub fn from_path(path: &Path) -> Option<Rectangle> {
        let segments = path.segments();
        let mut iter = segments.iter();
        let mut corners: smallvec::SmallVec<[(f64, f64); 5]> = smallvec::SmallVec::new();

        match iter.next()? {
            PathSegment::MoveTo(x, y) => corners.push((*x, *y)),
            _ => return None,
        }
        let mut closed = false;
        for seg in iter {
            if closed {
                return None;
            }
            match *seg {
                PathSegment::LineTo(x, y) => corners.push((x, y)),
                PathSegment::ClosePath => closed = true,
                _ => return None,
            }
        }

        if corners.len() == 5 {
            if corners[4] != corners[0] {
                return None;
            }
            corners.pop();
        }
        if corners.len() != 4 {
            return None;
        }

        let mut horizontal_first = None;
        for i in 0..4 {
            let (ax, ay) = corners[i];
            let (bx, by) = corners[(i + 1) % 4];
            let horizontal = ay == by && ax != bx;
            let vertical = ax == bx && ay != by;
            if !horizontal && !vertical {
                return None;
            }
            let expected = match horizontal_first {
                None => {
                    horizontal_first = Some(horizontal);
                    horizontal
                }
                Some(first) => first == (i % 2 == 0),
            };
            if horizontal != expected {
                return None;
            }
        }

        let (x0, y0) = corners[0];
        let (x2, y2) = corners[2];
        if x0 == x2 || y0 == y2 {
            return None;
        }
        Some(Rectangle::new(x0, y0, x2, y2))
    }

    /// Like [`Self::from_path`], but only for explicitly closed subpaths.
    ///
    /// Strokes do not close implicitly: an open four-corner path leaves an
    /// edge undrawn and caps its ends.
    pub fn from_closed_path(path: &Path) -> Option<Rectangle> {
        match path.segments().last() {
            Some(PathSegment::ClosePath) => Self::from_path(path),
            _ => None,
        }
    }
}
