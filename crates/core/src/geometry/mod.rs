//! Geometry primitives: affine matrices, paths and rectangles.

pub mod matrix;
pub mod path;
pub mod rect;

pub use matrix::Matrix;
pub use path::{Path, PathSegment};
pub use rect::Rectangle;
