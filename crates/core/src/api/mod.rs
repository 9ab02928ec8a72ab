//! Page conversion API.
//!
//! This module provides the main public API for converting pages into scene
//! documents.
//!
//! # Example
//!
//! ```ignore
//! use folio_core::api::{Page, convert_page};
//!
//! let page = Page::from_bytes(crop_box, &content_bytes, resources);
//! let svg = convert_page(&page, &ConvertOptions::default())?.to_svg();
//! ```

pub mod convert;

// Re-export for convenience
pub use convert::{Page, PageConverter, convert_page, convert_pages};
pub use crate::interp::{Annotation, CancellationToken};
