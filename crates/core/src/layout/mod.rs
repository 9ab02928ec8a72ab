//! Text layout for the scene graph.
//!
//! This module contains:
//! - Paragraph and span building from positioned glyph runs
//! - Paragraph emission as `text`/`tspan` nodes

pub mod text;

pub use text::{TextBuilder, TextPart, TextParagraph, TextSpan, TextStyle};
