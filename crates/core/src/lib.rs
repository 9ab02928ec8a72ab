//! folio - PDF content stream interpreter emitting a deduplicated SVG scene graph.

pub mod api;
pub mod error;
pub mod geometry;
pub mod interp;
pub mod layout;
pub mod model;
pub mod output;
pub mod params;
pub mod parser;

// Re-export the conversion entry points
pub use api::{Page, PageConverter, convert_page, convert_pages};

// Re-export core types
pub use interp::{Annotation, CancellationToken, PageInterpreter};
pub use output::{Document, Node};
pub use params::ConvertOptions;

pub use error::{FolioError, Result};
