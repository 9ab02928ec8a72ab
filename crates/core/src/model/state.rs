//! Graphics and text state.
//!
//! Both are plain values: `q` pushes a clone and `Q` replaces the current
//! state with the popped one.

use smol_str::SmolStr;
use std::sync::Arc;

use super::color::{ColorSpace, Rgb};
use super::resources::Font;
use crate::geometry::Matrix;
use crate::interp::clip::ClipRef;

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub rgb: Rgb,
    pub color_space: ColorSpace,
    /// Raw color components in `color_space`.
    pub components: Vec<f64>,
    /// Pattern resource name when painting with a pattern.
    pub pattern: Option<SmolStr>,
    pub alpha: f64,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            rgb: Rgb::BLACK,
            color_space: ColorSpace::DeviceGray,
            components: vec![0.0],
            pattern: None,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::Square),
            _ => None,
        }
    }

    pub const fn css(&self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Miter),
            1 => Some(Self::Round),
            2 => Some(Self::Bevel),
            _ => None,
        }
    }

    pub const fn css(&self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

/// Dash pattern: lengths and phase, in user space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dash {
    pub array: Vec<f64>,
    pub phase: f64,
}

impl Dash {
    /// A dash array of all zeros (or empty) draws a solid line.
    pub fn is_solid(&self) -> bool {
        self.array.iter().all(|v| *v == 0.0)
    }
}

/// Text rendering mode (`Tr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderMode {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Fill,
            1 => Self::Stroke,
            2 => Self::FillStroke,
            3 => Self::Invisible,
            4 => Self::FillClip,
            5 => Self::StrokeClip,
            6 => Self::FillStrokeClip,
            7 => Self::Clip,
            _ => return None,
        })
    }

    pub const fn fills(&self) -> bool {
        matches!(self, Self::Fill | Self::FillStroke | Self::FillClip | Self::FillStrokeClip)
    }

    pub const fn strokes(&self) -> bool {
        matches!(
            self,
            Self::Stroke | Self::FillStroke | Self::StrokeClip | Self::FillStrokeClip
        )
    }

    pub const fn clips(&self) -> bool {
        matches!(
            self,
            Self::FillClip | Self::StrokeClip | Self::FillStrokeClip | Self::Clip
        )
    }

    /// Neither filled nor stroked.
    pub const fn is_invisible(&self) -> bool {
        !self.fills() && !self.strokes()
    }
}

/// Font reference compared by identity.
#[derive(Debug, Clone)]
pub struct FontRef(pub Arc<dyn Font>);

impl PartialEq for FontRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.id() == other.0.id()
    }
}

/// Text state: positioning and rendering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    /// Text matrix (Tm)
    pub matrix: Matrix,
    /// Line matrix, the start of the current line
    pub line_matrix: Matrix,
    /// Text leading (TL)
    pub leading: f64,
    pub font: Option<FontRef>,
    /// Font resource name, kept for traces
    pub font_name: Option<SmolStr>,
    pub font_size: f64,
    /// Character spacing (Tc)
    pub char_spacing: f64,
    /// Word spacing (Tw)
    pub word_spacing: f64,
    /// Horizontal scaling percentage (Tz, 100 = normal)
    pub scaling: f64,
    /// Text rise (Ts)
    pub rise: f64,
    pub render_mode: TextRenderMode,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            font: None,
            font_name: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scaling: 100.0,
            rise: 0.0,
            render_mode: TextRenderMode::Fill,
        }
    }
}

impl TextState {
    /// Resets text and line matrices at the start of a text object (`BT`).
    pub fn reset(&mut self) {
        self.matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }
}

/// Graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    /// Current transformation matrix
    pub ctm: Matrix,
    pub fill: Paint,
    pub stroke: Paint,
    /// Line width in user space
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub dash: Dash,
    /// CSS blend mode, `None` for Normal
    pub blend_mode: Option<SmolStr>,
    /// Definition id of the active soft mask
    pub soft_mask: Option<SmolStr>,
    /// Active clip node
    pub clip: Option<ClipRef>,
    pub rendering_intent: Option<SmolStr>,
    pub flatness: f64,
    pub text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new(Matrix::IDENTITY)
    }
}

impl GraphicsState {
    /// Initial state for a content stream executed under `ctm`.
    pub fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            fill: Paint::default(),
            stroke: Paint::default(),
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: Dash::default(),
            blend_mode: None,
            soft_mask: None,
            clip: None,
            rendering_intent: None,
            flatness: 1.0,
            text: TextState::default(),
        }
    }
}
