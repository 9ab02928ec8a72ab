//! Collaborator interfaces consumed by the interpreter.
//!
//! The document model, font decoding, color conversion and image decoding
//! live outside this crate. The interpreter only sees them through the traits
//! in this module, scoped to the resource dictionary of the content being
//! executed.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::geometry::{Matrix, Rectangle};
use crate::model::color::{ColorSpace, Rgb};
use crate::model::objects::{ContentStream, Operand};

/// Text decoded from a string operand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedText {
    /// Unicode text.
    pub text: String,
    /// Total advance of all glyphs in glyph space (1/1000 em).
    pub width: f64,
    /// Number of glyph codes, the unit character spacing applies to.
    pub glyph_count: usize,
}

/// Glyph procedures of a Type 3 font.
#[derive(Debug, Clone)]
pub struct Type3Glyphs {
    /// Maps glyph space to text space.
    pub font_matrix: Matrix,
    /// Content stream per single-byte character code.
    pub procs: FxHashMap<u8, ContentStream>,
    /// Resources of the glyph procedures, if the font carries its own.
    pub resources: Option<Arc<dyn Resources>>,
}

/// A font as needed for layout.
pub trait Font: Send + Sync + fmt::Debug {
    /// Stable identity, used to share style rules between runs.
    fn id(&self) -> &str;

    fn decode(&self, bytes: &[u8]) -> DecodedText;

    /// CSS font family.
    fn family(&self) -> &str;

    fn bold(&self) -> bool {
        false
    }

    fn italic(&self) -> bool {
        false
    }

    /// Word spacing applies to the single-byte code 32 only, so it is
    /// meaningful for simple fonts and ignored for multi-byte encodings.
    fn word_spacing_applies(&self) -> bool {
        true
    }

    fn type3(&self) -> Option<&Type3Glyphs> {
        None
    }
}

/// Font used when a font resource is missing: Latin-1 bytes, fixed advance.
#[derive(Debug, Clone)]
pub struct FallbackFont {
    family: SmolStr,
    advance: f64,
}

impl FallbackFont {
    pub fn new(family: &str, advance: f64) -> Self {
        Self {
            family: SmolStr::new(family),
            advance,
        }
    }
}

impl Default for FallbackFont {
    fn default() -> Self {
        Self::new("sans-serif", 500.0)
    }
}

impl Font for FallbackFont {
    fn id(&self) -> &str {
        "fallback"
    }

    fn decode(&self, bytes: &[u8]) -> DecodedText {
        DecodedText {
            text: bytes.iter().map(|&b| b as char).collect(),
            width: bytes.len() as f64 * self.advance,
            glyph_count: bytes.len(),
        }
    }

    fn family(&self) -> &str {
        &self.family
    }
}

/// A decoded image, addressed by content.
pub trait Image: Send + Sync + fmt::Debug {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn interpolate(&self) -> bool {
        false
    }

    /// Identity of the image data, used to emit each image once.
    fn content_key(&self) -> &str;

    /// Stencil masks are painted with the current fill color.
    fn is_mask(&self) -> bool {
        false
    }

    /// Reference usable as an `href` (data URL or external location).
    fn resolve_url(&self) -> Result<String>;
}

/// Form XObject.
#[derive(Debug, Clone)]
pub struct Form {
    /// Identity used to detect self-referencing forms.
    pub id: SmolStr,
    pub content: ContentStream,
    pub matrix: Matrix,
    pub bbox: Option<Rectangle>,
    pub resources: Option<Arc<dyn Resources>>,
    /// Transparency group attributes, if the form is a group.
    pub group: Option<TransparencyGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransparencyGroup {
    pub isolated: bool,
    pub knockout: bool,
}

#[derive(Debug, Clone)]
pub enum XObject {
    Form(Arc<Form>),
    Image(Arc<dyn Image>),
}

/// Gradient color stop, precomputed by the shading collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShadingKind {
    /// Linear gradient between `(x0, y0)` and `(x1, y1)`.
    Axial { coords: [f64; 4], extend: (bool, bool) },
    /// Radial gradient `(x0, y0, r0)` to `(x1, y1, r1)`.
    Radial { coords: [f64; 6], extend: (bool, bool) },
    /// Function-based and mesh shadings; approximated by their average color.
    Unsupported(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shading {
    pub id: SmolStr,
    pub kind: ShadingKind,
    pub stops: Vec<GradientStop>,
    pub background: Option<Rgb>,
    pub bbox: Option<Rectangle>,
}

impl Shading {
    /// Average stop color, used where a gradient cannot be expressed.
    pub fn average_color(&self) -> Rgb {
        if self.stops.is_empty() {
            return self.background.unwrap_or(Rgb::BLACK);
        }
        let n = self.stops.len() as f64;
        let (r, g, b) = self.stops.iter().fold((0.0, 0.0, 0.0), |acc, s| {
            (acc.0 + s.color.r, acc.1 + s.color.g, acc.2 + s.color.b)
        });
        Rgb::new(r / n, g / n, b / n)
    }
}

/// Tiling pattern cell.
#[derive(Debug, Clone)]
pub struct TilingPattern {
    pub id: SmolStr,
    pub content: ContentStream,
    pub matrix: Matrix,
    pub bbox: Rectangle,
    pub x_step: f64,
    pub y_step: f64,
    /// Uncolored patterns (PaintType 2) take their color from the `scn` operands.
    pub uncolored: bool,
    pub resources: Option<Arc<dyn Resources>>,
}

#[derive(Debug, Clone)]
pub struct ShadingPattern {
    pub shading: Arc<Shading>,
    pub matrix: Matrix,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Tiling(Arc<TilingPattern>),
    Shading(Arc<ShadingPattern>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftMaskKind {
    Luminosity,
    Alpha,
}

/// Soft mask defined by a transparency group.
#[derive(Debug, Clone)]
pub struct SoftMask {
    pub kind: SoftMaskKind,
    pub group: Arc<Form>,
    /// Backdrop color for luminosity masks.
    pub backdrop: Option<Rgb>,
}

/// Parameters of a graphics state parameter dictionary (`gs`).
#[derive(Debug, Clone, Default)]
pub struct ExtGState {
    pub line_width: Option<f64>,
    pub line_cap: Option<i64>,
    pub line_join: Option<i64>,
    pub miter_limit: Option<f64>,
    pub dash: Option<(Vec<f64>, f64)>,
    pub fill_alpha: Option<f64>,
    pub stroke_alpha: Option<f64>,
    pub blend_mode: Option<SmolStr>,
    /// `Some(None)` resets the soft mask (`/SMask /None`).
    pub soft_mask: Option<Option<Arc<SoftMask>>>,
    pub font: Option<(Arc<dyn Font>, f64)>,
}

/// Kind of a named resource, used to build cross-page cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Font,
    ColorSpace,
}

/// Resource lookup scoped to one resource dictionary.
pub trait Resources: Send + Sync + fmt::Debug {
    fn font(&self, name: &str) -> Option<Arc<dyn Font>>;
    fn color_space(&self, name: &str) -> Option<ColorSpace>;
    fn pattern(&self, name: &str) -> Option<Pattern>;
    fn shading(&self, name: &str) -> Option<Arc<Shading>>;
    fn xobject(&self, name: &str) -> Option<XObject>;
    fn ext_gstate(&self, name: &str) -> Option<ExtGState>;

    /// Marked content property lists (`BDC /Tag /Name`).
    fn properties(&self, _name: &str) -> Option<IndexMap<SmolStr, Operand>> {
        None
    }

    /// Identity of the resolved object behind `name`, shared across pages
    /// that reference the same object. Resources without identities are not
    /// cached.
    fn resource_key(&self, _kind: ResourceKind, _name: &str) -> Option<u64> {
        None
    }

    /// Decodes an inline image (`BI ... ID ... EI`).
    fn inline_image(
        &self,
        _dict: &IndexMap<SmolStr, Operand>,
        _data: &[u8],
    ) -> Option<Arc<dyn Image>> {
        None
    }
}

/// In-memory resource dictionary.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    pub fonts: FxHashMap<SmolStr, Arc<dyn Font>>,
    pub color_spaces: FxHashMap<SmolStr, ColorSpace>,
    pub patterns: FxHashMap<SmolStr, Pattern>,
    pub shadings: FxHashMap<SmolStr, Arc<Shading>>,
    pub xobjects: FxHashMap<SmolStr, XObject>,
    pub ext_gstates: FxHashMap<SmolStr, ExtGState>,
    pub properties: FxHashMap<SmolStr, IndexMap<SmolStr, Operand>>,
    /// Object identities for [`Resources::resource_key`].
    pub keys: FxHashMap<(ResourceKind, SmolStr), u64>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, name: &str, font: Arc<dyn Font>) -> Self {
        self.fonts.insert(SmolStr::new(name), font);
        self
    }

    pub fn with_color_space(mut self, name: &str, cs: ColorSpace) -> Self {
        self.color_spaces.insert(SmolStr::new(name), cs);
        self
    }

    pub fn with_pattern(mut self, name: &str, pattern: Pattern) -> Self {
        self.patterns.insert(SmolStr::new(name), pattern);
        self
    }

    pub fn with_shading(mut self, name: &str, shading: Arc<Shading>) -> Self {
        self.shadings.insert(SmolStr::new(name), shading);
        self
    }

    pub fn with_xobject(mut self, name: &str, xobject: XObject) -> Self {
        self.xobjects.insert(SmolStr::new(name), xobject);
        self
    }

    pub fn with_ext_gstate(mut self, name: &str, gs: ExtGState) -> Self {
        self.ext_gstates.insert(SmolStr::new(name), gs);
        self
    }

    pub fn with_key(mut self, kind: ResourceKind, name: &str, key: u64) -> Self {
        self.keys.insert((kind, SmolStr::new(name)), key);
        self
    }
}

impl Resources for MemoryResources {
    fn font(&self, name: &str) -> Option<Arc<dyn Font>> {
        self.fonts.get(name).cloned()
    }

    fn color_space(&self, name: &str) -> Option<ColorSpace> {
        self.color_spaces.get(name).cloned()
    }

    fn pattern(&self, name: &str) -> Option<Pattern> {
        self.patterns.get(name).cloned()
    }

    fn shading(&self, name: &str) -> Option<Arc<Shading>> {
        self.shadings.get(name).cloned()
    }

    fn xobject(&self, name: &str) -> Option<XObject> {
        self.xobjects.get(name).cloned()
    }

    fn ext_gstate(&self, name: &str) -> Option<ExtGState> {
        self.ext_gstates.get(name).cloned()
    }

    fn properties(&self, name: &str) -> Option<IndexMap<SmolStr, Operand>> {
        self.properties.get(name).cloned()
    }

    fn resource_key(&self, kind: ResourceKind, name: &str) -> Option<u64> {
        self.keys.get(&(kind, SmolStr::new(name))).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_font_decodes_latin1() {
        let font = FallbackFont::default();
        let decoded = font.decode(b"Hi \xe9");
        assert_eq!(decoded.text, "Hi \u{e9}");
        assert_eq!(decoded.glyph_count, 4);
        assert_eq!(decoded.width, 2000.0);
    }

    #[test]
    fn test_average_color() {
        let shading = Shading {
            id: "s".into(),
            kind: ShadingKind::Unsupported(4),
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: Rgb::BLACK,
                },
                GradientStop {
                    offset: 1.0,
                    color: Rgb::WHITE,
                },
            ],
            background: None,
            bbox: None,
        };
        assert_eq!(shading.average_color(), Rgb::new(0.5, 0.5, 0.5));
    }
}
