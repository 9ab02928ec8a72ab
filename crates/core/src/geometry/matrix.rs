//! 2D affine transformation matrix.
//!
//! PDF uses matrices of the form:
//! ```text
//! [ a  b  0 ]
//! [ c  d  0 ]
//! [ e  f  1 ]
//! ```
//! with row vectors, so a point `(x, y)` maps to `(ax + cy + e, bx + dy + f)`.

use crate::error::{FolioError, Result};

/// Determinants below this magnitude are considered singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// A 2D transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Creates a matrix from a six-element array `[a b c d e f]`.
    pub fn from_array(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, d, e, f] => Some(Self::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }

    /// Multiply this matrix with another matrix.
    ///
    /// The result applies `self` first, then `other`. Content stream operators
    /// pre-multiply the incoming matrix: `cm` computes `m.multiply(&ctm)`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Computes the inverse matrix.
    ///
    /// Fails with [`FolioError::NotInvertible`] when the determinant is ~0.
    pub fn invert(&self) -> Result<Matrix> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON || !det.is_finite() {
            return Err(FolioError::NotInvertible(det));
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Ok(Matrix {
            a,
            b,
            c,
            d,
            e: -(self.e * a + self.f * c),
            f: -(self.e * b + self.f * d),
        })
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Transform a vector (the translation part is ignored).
    pub fn transform_vector(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// True when the matrix has no rotation, skew or scale.
    pub fn is_translation(&self) -> bool {
        self.a == 1.0 && self.b == 0.0 && self.c == 0.0 && self.d == 1.0
    }

    /// Returns the matrix with its translation components removed.
    pub fn without_translation(&self) -> Matrix {
        Matrix {
            e: 0.0,
            f: 0.0,
            ..*self
        }
    }

    /// Element-wise comparison within `epsilon`, scaled by the magnitude of the
    /// compared components.
    pub fn approx_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        let close = |x: f64, y: f64| (x - y).abs() <= epsilon * (1.0 + x.abs().max(y.abs()));
        close(self.a, other.a)
            && close(self.b, other.b)
            && close(self.c, other.c)
            && close(self.d, other.d)
            && close(self.e, other.e)
            && close(self.f, other.f)
    }

    /// Scale factor applied to lengths when the matrix is uniform
    /// (the square root of the absolute determinant).
    pub fn mean_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// True when the linear part is a rotation/reflection times a uniform
    /// scale, so circles stay circles.
    pub fn is_uniform(&self) -> bool {
        let sx = self.a.hypot(self.b);
        let sy = self.c.hypot(self.d);
        let dot = self.a * self.c + self.b * self.d;
        let tol = 1e-9 * (1.0 + sx.max(sy));
        (sx - sy).abs() <= tol && dot.abs() <= tol * (1.0 + sx.max(sy))
    }

    /// True when the matrix maps axis-aligned rectangles to axis-aligned
    /// rectangles (no rotation other than multiples of 90 degrees, no skew).
    pub fn is_axis_aligned(&self) -> bool {
        (self.b == 0.0 && self.c == 0.0) || (self.a == 0.0 && self.d == 0.0)
    }

    /// Splits the matrix into a uniform scale and a remainder so that
    /// `Matrix::scaling(scale, scale).multiply(&remainder) == self`.
    pub fn decompose_scale(&self) -> (f64, Matrix) {
        let scale = self.mean_scale();
        if !(scale > SINGULAR_EPSILON) || !scale.is_finite() {
            return (1.0, *self);
        }
        let remainder = Matrix {
            a: self.a / scale,
            b: self.b / scale,
            c: self.c / scale,
            d: self.d / scale,
            e: self.e,
            f: self.f,
        };
        (scale, remainder)
    }

    /// Splits the matrix into a uniform scale, a translation and a remainder
    /// without translation:
    /// `scaling(s, s) * translation(tx, ty) * remainder == self`.
    ///
    /// Used by the text layout engine: text is placed at `(tx, ty)` inside the
    /// remainder's coordinate space, and runs sharing `scale` and `remainder`
    /// differ only by an offset.
    pub fn decompose_scale_translate(&self) -> (f64, f64, f64, Matrix) {
        let (scale, rest) = self.decompose_scale();
        let linear = rest.without_translation();
        match linear.invert() {
            Ok(inv) => {
                let (tx, ty) = inv.transform_vector(self.e, self.f);
                (scale, tx, ty, linear)
            }
            Err(_) => (1.0, 0.0, 0.0, *self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_multiply() {
        let m = Matrix::new(2.0, 1.0, -1.0, 3.0, 5.0, 7.0);
        assert_eq!(m.multiply(&Matrix::IDENTITY), m);
        assert_eq!(Matrix::IDENTITY.multiply(&m), m);
    }

    #[test]
    fn test_multiply_applies_self_first() {
        let scale = Matrix::scaling(2.0, 2.0);
        let translate = Matrix::translation(10.0, 0.0);
        let m = scale.multiply(&translate);
        assert_eq!(m.transform_point(1.0, 1.0), (12.0, 2.0));
        let m = translate.multiply(&scale);
        assert_eq!(m.transform_point(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let m = Matrix::new(2.0, 0.5, -1.0, 3.0, 5.0, 7.0);
        let inv = m.invert().unwrap();
        assert!(m.multiply(&inv).approx_eq(&Matrix::IDENTITY, 1e-12));
    }

    #[test]
    fn test_invert_singular() {
        let m = Matrix::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0);
        assert!(matches!(m.invert(), Err(FolioError::NotInvertible(_))));
    }

    #[test]
    fn test_decompose_scale_translate() {
        let m = Matrix::new(12.0, 0.0, 0.0, 12.0, 100.0, 200.0);
        let (s, tx, ty, rest) = m.decompose_scale_translate();
        assert_eq!(s, 12.0);
        assert!((tx - 100.0).abs() < 1e-12);
        assert!((ty - 200.0).abs() < 1e-12);
        assert!(rest.is_identity());
    }

    #[test]
    fn test_uniform_detection() {
        assert!(Matrix::new(0.0, 2.0, -2.0, 0.0, 1.0, 1.0).is_uniform());
        assert!(Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, 0.0).is_uniform());
        assert!(!Matrix::scaling(1.0, 2.0).is_uniform());
    }
}
