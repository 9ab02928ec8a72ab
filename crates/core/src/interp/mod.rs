//! PDF content stream interpretation.
//!
//! This module contains:
//! - `dispatch`: operator table and operand coercion
//! - `interpreter`: page interpreter, nesting and cancellation
//! - `clip`: clip region arena
//! - `emit`: node emission under clips, blend modes and soft masks
//! - `ops`: operator implementations by category

pub mod clip;
pub mod dispatch;
mod emit;
pub mod interpreter;
pub mod ops;

// Re-export main types for convenience
pub use clip::{ClipArena, ClipRef};
pub use dispatch::{Arg, Args, OperatorTable, Param};
pub use interpreter::{Annotation, CancellationToken, PageInterpreter};
