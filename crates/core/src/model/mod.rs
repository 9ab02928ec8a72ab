//! Data model: operands, colors, graphics state and collaborator interfaces.

pub mod cache;
pub mod color;
pub mod objects;
pub mod resources;
pub mod state;

pub use cache::ResourceCache;
pub use color::{ColorConverter, ColorSpace, Rgb};
pub use objects::{ContentStream, Operand, Operation};
pub use resources::{
    DecodedText, ExtGState, FallbackFont, Font, Form, GradientStop, Image, MemoryResources,
    Pattern, ResourceKind, Resources, Shading, ShadingKind, ShadingPattern, SoftMask,
    SoftMaskKind, TilingPattern, TransparencyGroup, Type3Glyphs, XObject,
};
pub use state::{Dash, FontRef, GraphicsState, LineCap, LineJoin, Paint, TextRenderMode, TextState};
