//! Page conversion API.
//!
//! Provides the main entry points:
//! - `convert_page()` - Convert one page into a scene document
//! - `convert_pages()` - Convert pages in parallel with a shared cache
//! - `PageConverter` - Reusable converter with cancellation

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::Result;
use crate::geometry::{Matrix, Rectangle};
use crate::interp::{Annotation, CancellationToken, PageInterpreter};
use crate::model::cache::ResourceCache;
use crate::model::objects::ContentStream;
use crate::model::resources::Resources;
use crate::output::Document;
use crate::params::ConvertOptions;
use crate::parser::parse_content;

/// A page to convert: its visible region, content and resources.
#[derive(Debug, Clone)]
pub struct Page {
    /// Visible region in default user space.
    pub crop_box: Rectangle,
    /// Clockwise display rotation in degrees, a multiple of 90.
    pub rotation: i32,
    pub content: ContentStream,
    pub resources: Arc<dyn Resources>,
    pub annotations: Vec<Annotation>,
}

impl Page {
    pub fn new(crop_box: Rectangle, content: ContentStream, resources: Arc<dyn Resources>) -> Self {
        Self {
            crop_box,
            rotation: 0,
            content,
            resources,
            annotations: Vec::new(),
        }
    }

    /// Creates a page from raw content stream bytes.
    pub fn from_bytes(crop_box: Rectangle, data: &[u8], resources: Arc<dyn Resources>) -> Self {
        Self::new(crop_box, parse_content(data).into(), resources)
    }

    pub fn with_rotation(mut self, rotation: i32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Rotation normalized to 0, 90, 180 or 270. Other values count as 0.
    fn normalized_rotation(&self) -> i32 {
        match self.rotation.rem_euclid(360) {
            r @ (90 | 180 | 270) => r,
            _ => 0,
        }
    }

    /// Output viewport size, after rotation.
    pub fn size(&self) -> (f64, f64) {
        let (w, h) = (self.crop_box.width(), self.crop_box.height());
        match self.normalized_rotation() {
            90 | 270 => (h, w),
            _ => (w, h),
        }
    }

    /// Maps default user space (origin bottom-left, y up) to the output
    /// viewport (origin top-left, y down), applying the display rotation.
    pub fn base_ctm(&self) -> Matrix {
        let cb = &self.crop_box;
        let (w, h) = (cb.width(), cb.height());
        let flip = Matrix::new(1.0, 0.0, 0.0, -1.0, -cb.x1, cb.y2);
        let rotate = match self.normalized_rotation() {
            90 => Matrix::new(0.0, 1.0, -1.0, 0.0, h, 0.0),
            180 => Matrix::new(-1.0, 0.0, 0.0, -1.0, w, h),
            270 => Matrix::new(0.0, -1.0, 1.0, 0.0, 0.0, w),
            _ => Matrix::IDENTITY,
        };
        flip.multiply(&rotate)
    }
}

/// Converter shared by many pages: options, cross-page cache and
/// cancellation signal.
#[derive(Debug, Clone)]
pub struct PageConverter {
    options: ConvertOptions,
    cache: Arc<ResourceCache>,
    cancel: CancellationToken,
}

impl PageConverter {
    /// Creates a converter; fails when the options are inconsistent.
    pub fn new(options: ConvertOptions) -> Result<Self> {
        Ok(Self {
            options: options.validated()?,
            cache: Arc::new(ResourceCache::new()),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cache(mut self, cache: Arc<ResourceCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Token that cancels conversions started by this converter.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn interpreter(&self, page: &Page) -> PageInterpreter {
        let (width, height) = page.size();
        PageInterpreter::new(
            page.base_ctm(),
            width,
            height,
            page.resources.clone(),
            self.options.clone(),
        )
        .with_cache(self.cache.clone())
        .with_cancellation(self.cancel.clone())
    }

    /// Converts a page: content first, then visible annotation appearances.
    pub fn convert(&self, page: &Page) -> Result<Document> {
        let mut interp = self.interpreter(page);
        interp.execute(&page.content)?;
        for annot in &page.annotations {
            interp.render_annotation(annot)?;
        }
        let doc = interp.finish();
        tracing::debug!(
            width = doc.width,
            height = doc.height,
            nodes = doc.root.count(),
            "page converted"
        );
        Ok(doc)
    }

    /// Converts pages in parallel. Results keep the order of `pages`.
    pub fn convert_all(&self, pages: &[Page]) -> Vec<Result<Document>> {
        pages.par_iter().map(|page| self.convert(page)).collect()
    }
}

/// Converts a single page.
pub fn convert_page(page: &Page, options: &ConvertOptions) -> Result<Document> {
    PageConverter::new(options.clone())?.convert(page)
}

/// Converts pages in parallel, sharing resolved fonts and color spaces
/// across pages. Fails with the first page error.
pub fn convert_pages(pages: &[Page], options: &ConvertOptions) -> Result<Vec<Document>> {
    PageConverter::new(options.clone())?
        .convert_all(pages)
        .into_iter()
        .collect()
}
