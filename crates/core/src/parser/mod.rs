//! Content stream parsing.
//!
//! - `lexer`: content stream tokenizer
//! - `content`: operation grouping and inline images

pub mod content;
pub mod lexer;

// Re-export main types for convenience
pub use content::{ContentParser, parse_content};
pub use lexer::{ContentLexer, Token};
