//! Text layout engine.
//!
//! Glyph runs are grouped into paragraphs. A paragraph shares one uniform
//! scale, one baseline and one residual transform, so the runs inside it only
//! differ by a horizontal offset and can be emitted as a single text element
//! with per-span offsets.
//!
//! Positions are tracked in the decomposed space of the text rendering
//! matrix: `M = Scale(s) * Translate(tx, ty) * residual`, see
//! [`Matrix::decompose_scale_translate`].

use smol_str::SmolStr;
use std::sync::Arc;

use crate::geometry::Matrix;
use crate::model::color::Rgb;
use crate::model::state::TextRenderMode;
use crate::output::defs::DefsPool;
use crate::output::node::Node;
use crate::params::ConvertOptions;

/// Relative tolerance when comparing line geometry between runs.
const LINE_EPSILON: f64 = 1e-6;

/// Styling shared by consecutive glyph runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: SmolStr,
    pub bold: bool,
    pub italic: bool,
    /// Font size in decomposed units
    pub font_size: f64,
    /// Fill color and alpha, `None` when not filled
    pub fill: Option<(Rgb, f64)>,
    /// Pattern or gradient id used instead of the fill color
    pub fill_ref: Option<SmolStr>,
    /// Stroke color, alpha and width, `None` when not stroked
    pub stroke: Option<(Rgb, f64, f64)>,
    /// Character spacing in decomposed units
    pub letter_spacing: f64,
    /// Horizontal scaling percentage
    pub scaling: f64,
    pub render_mode: TextRenderMode,
}

impl TextStyle {
    /// CSS declarations for the style.
    pub fn css(&self, opts: &ConvertOptions) -> String {
        let mut decl = Vec::with_capacity(8);
        decl.push(format!("font-family:{}", self.font_family));
        decl.push(format!("font-size:{}px", opts.fmt(self.font_size)));
        if self.bold {
            decl.push("font-weight:bold".to_string());
        }
        if self.italic {
            decl.push("font-style:italic".to_string());
        }
        decl.push("white-space:pre".to_string());
        match (&self.fill_ref, &self.fill) {
            (Some(id), _) => decl.push(format!("fill:url(#{})", id)),
            (None, Some((rgb, alpha))) => {
                decl.push(format!("fill:{}", rgb.to_css()));
                if *alpha < 1.0 {
                    decl.push(format!("fill-opacity:{}", opts.fmt(*alpha)));
                }
            }
            (None, None) => decl.push("fill:none".to_string()),
        }
        if let Some((rgb, alpha, width)) = &self.stroke {
            decl.push(format!("stroke:{}", rgb.to_css()));
            decl.push(format!("stroke-width:{}", opts.fmt(*width)));
            if *alpha < 1.0 {
                decl.push(format!("stroke-opacity:{}", opts.fmt(*alpha)));
            }
        }
        if self.letter_spacing != 0.0 {
            decl.push(format!("letter-spacing:{}px", opts.fmt(self.letter_spacing)));
        }
        decl.join(";")
    }
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Glyph advance of the span, excluding leading spaces
    pub width: f64,
    /// Extra space before each character
    pub leading_spaces: Vec<f64>,
    pub style: Arc<TextStyle>,
}

impl TextSpan {
    /// Horizontal extent including all leading spaces.
    pub fn extent(&self) -> f64 {
        self.width + self.leading_spaces.iter().sum::<f64>()
    }
}

/// The unit that becomes one output text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParagraph {
    pub x: f64,
    pub y: f64,
    /// Residual transform, with scale and translation factored out
    pub transform: Matrix,
    pub spans: Vec<TextSpan>,
    /// Pre-rendered Type 3 glyphs, in place of spans
    pub type3: Option<Vec<Node>>,
}

/// Line geometry of the open paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineKey {
    scale: f64,
    ty: f64,
    transform: Matrix,
}

impl LineKey {
    fn continues(&self, other: &LineKey) -> bool {
        close(self.scale, other.scale)
            && close(self.ty, other.ty)
            && self.transform.approx_eq(&other.transform, LINE_EPSILON)
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= LINE_EPSILON * (1.0 + a.abs().max(b.abs()))
}

/// Accumulates glyph runs of one text object into paragraphs.
#[derive(Debug)]
pub struct TextBuilder {
    paragraphs: Vec<TextParagraph>,
    line: Option<LineKey>,
    /// End of the previous run
    cursor_x: f64,
    /// Space accumulated since the previous run
    pending: f64,
    merge_distance: f64,
    merge_space_em: f64,
    min_space: f64,
}

impl TextBuilder {
    pub fn new(opts: &ConvertOptions) -> Self {
        Self {
            paragraphs: Vec::new(),
            line: None,
            cursor_x: 0.0,
            pending: 0.0,
            merge_distance: opts.text_merge_distance,
            merge_space_em: opts.merge_space_em,
            min_space: opts.min_space_px,
        }
    }

    pub fn paragraphs(&self) -> &[TextParagraph] {
        &self.paragraphs
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Scale of the current line, 1 before the first positioning.
    pub fn scale(&self) -> f64 {
        self.line.map_or(1.0, |l| l.scale)
    }

    /// Moves to the position described by a text rendering matrix (without
    /// font size). Returns the uniform scale of the matrix.
    ///
    /// Continuing the open paragraph accumulates the horizontal offset as
    /// pending space; anything else starts a new paragraph.
    pub fn position(&mut self, m: &Matrix) -> f64 {
        let (scale, tx, ty, transform) = m.decompose_scale_translate();
        let key = LineKey {
            scale,
            ty,
            transform,
        };
        let continues = self.line.as_ref().is_some_and(|l| l.continues(&key))
            && (tx - self.cursor_x).abs() < self.merge_distance
            && !self.paragraphs.last().is_some_and(|p| p.type3.is_some());
        if continues {
            self.pending += tx - self.cursor_x;
        } else {
            self.paragraphs.push(TextParagraph {
                x: tx,
                y: ty,
                transform,
                spans: Vec::new(),
                type3: None,
            });
            self.line = Some(key);
            self.pending = 0.0;
        }
        self.cursor_x = tx;
        scale
    }

    /// Adds a decoded run at the current position. `width` is the run's
    /// advance in decomposed units.
    pub fn add_text(&mut self, text: &str, width: f64, style: Arc<TextStyle>) {
        if self.line.is_none() {
            self.position(&Matrix::IDENTITY);
        }
        // Nothing drawn: the advance becomes space before the next run.
        if text.is_empty() {
            return;
        }
        self.cursor_x += width;
        let threshold = (self.merge_space_em * style.font_size).max(self.min_space);
        let space = if self.pending.abs() < threshold {
            0.0
        } else {
            self.pending
        };
        self.pending = 0.0;

        let Some(paragraph) = self.paragraphs.last_mut() else {
            return;
        };
        let char_count = text.chars().count();
        match paragraph.spans.last_mut() {
            Some(last) if last.style == style => {
                last.text.push_str(text);
                last.leading_spaces.push(space);
                last.leading_spaces
                    .extend(std::iter::repeat_n(0.0, char_count - 1));
                last.width += width;
            }
            _ => {
                let mut leading_spaces = vec![0.0; char_count];
                leading_spaces[0] = space;
                paragraph.spans.push(TextSpan {
                    text: text.to_string(),
                    width,
                    leading_spaces,
                    style,
                });
            }
        }
    }

    /// Adds pre-rendered Type 3 glyphs as their own paragraph.
    pub fn add_type3(&mut self, nodes: Vec<Node>) {
        if nodes.is_empty() {
            return;
        }
        self.paragraphs.push(TextParagraph {
            x: 0.0,
            y: 0.0,
            transform: Matrix::IDENTITY,
            spans: Vec::new(),
            type3: Some(nodes),
        });
        self.line = None;
        self.pending = 0.0;
    }

    /// Returns the finished paragraphs, leaving the builder empty.
    pub fn take(&mut self) -> Vec<TextParagraph> {
        self.line = None;
        self.pending = 0.0;
        self.cursor_x = 0.0;
        std::mem::take(&mut self.paragraphs)
    }
}

/// Rendering partition of a paragraph's spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPart {
    Visible,
    /// Neither filled, stroked nor clipping (mode 3)
    Invisible,
    /// Contributes to the text clip
    Clip,
}

impl TextPart {
    fn includes(&self, mode: TextRenderMode) -> bool {
        match self {
            Self::Visible => !mode.is_invisible(),
            Self::Invisible => mode.is_invisible() && !mode.clips(),
            Self::Clip => mode.clips(),
        }
    }
}

/// Builds output nodes for the spans of `paragraph` that belong to `part`.
///
/// A paragraph with horizontal scaling other than 100% gets one
/// length-constrained text element per span; otherwise it becomes one text
/// element with a `tspan` per style change.
pub fn paragraph_nodes(
    paragraph: &TextParagraph,
    part: TextPart,
    opts: &ConvertOptions,
    defs: &mut DefsPool,
) -> Vec<Node> {
    if let Some(glyphs) = &paragraph.type3 {
        return match part {
            TextPart::Visible => glyphs.clone(),
            _ => Vec::new(),
        };
    }

    // Absolute start of each span's first glyph.
    let mut origin = paragraph.x;
    let placed: Vec<(f64, &TextSpan)> = paragraph
        .spans
        .iter()
        .map(|s| {
            let start = origin + s.leading_spaces.first().copied().unwrap_or(0.0);
            origin += s.extent();
            (start, s)
        })
        .collect();

    let selected: Vec<(usize, f64, &TextSpan)> = placed
        .iter()
        .enumerate()
        .filter(|(_, (_, s))| part.includes(s.style.render_mode))
        .map(|(i, (x, s))| (i, *x, *s))
        .collect();
    if selected.is_empty() {
        return Vec::new();
    }

    let transform =
        (!paragraph.transform.is_identity()).then(|| matrix_attr(&paragraph.transform, opts));
    let class_of = |defs: &mut DefsPool, style: &TextStyle| {
        let mut style = style.clone();
        if part == TextPart::Invisible {
            style.fill = Some((Rgb::BLACK, 0.0));
            style.fill_ref = None;
            style.stroke = None;
        }
        defs.style_class(&style.css(opts))
    };

    let scaled = selected.iter().any(|(_, _, s)| s.style.scaling != 100.0);
    if scaled {
        return selected
            .iter()
            .map(|(_, x, span)| {
                let mut node = Node::new("text")
                    .attr("class", class_of(defs, &span.style).as_str())
                    .attr("x", opts.fmt(*x))
                    .attr("y", opts.fmt(paragraph.y));
                if let Some(t) = &transform {
                    node.set_attr("transform", t.clone());
                }
                let inner = inner_spaces(span);
                if let Some(dx) = dx_attr(&inner, opts) {
                    node.set_attr("dx", dx);
                }
                node.set_attr("textLength", opts.fmt(span.width));
                node.set_attr("lengthAdjust", "spacingAndGlyphs");
                node.with_text(span.text.clone())
            })
            .collect();
    }

    let (_, first_x, first) = selected[0];
    let mut text = Node::new("text")
        .attr("x", opts.fmt(first_x))
        .attr("y", opts.fmt(paragraph.y));
    if let Some(t) = transform {
        text.set_attr("transform", t);
    }

    if selected.len() == 1 {
        text.set_attr("class", class_of(defs, &first.style).as_str());
        if let Some(dx) = dx_attr(&inner_spaces(first), opts) {
            text.set_attr("dx", dx);
        }
        return vec![text.with_text(first.text.clone())];
    }

    let mut prev_index = selected[0].0;
    for (n, (i, x, span)) in selected.iter().enumerate() {
        let mut tspan = Node::new("tspan").attr("class", class_of(defs, &span.style).as_str());
        if n > 0 && *i != prev_index + 1 {
            // Spans of another partition sit in between.
            tspan.set_attr("x", opts.fmt(*x));
            if let Some(dx) = dx_attr(&inner_spaces(span), opts) {
                tspan.set_attr("dx", dx);
            }
        } else {
            let spaces = if n == 0 {
                inner_spaces(span)
            } else {
                span.leading_spaces.clone()
            };
            if let Some(dx) = dx_attr(&spaces, opts) {
                tspan.set_attr("dx", dx);
            }
        }
        prev_index = *i;
        text.children.push(tspan.with_text(span.text.clone()));
    }
    vec![text]
}

/// Leading spaces with the first one zeroed, for spans placed absolutely.
fn inner_spaces(span: &TextSpan) -> Vec<f64> {
    let mut spaces = span.leading_spaces.clone();
    if let Some(first) = spaces.first_mut() {
        *first = 0.0;
    }
    spaces
}

/// Per-character `dx` list with trailing zeros removed.
fn dx_attr(spaces: &[f64], opts: &ConvertOptions) -> Option<String> {
    let rounded: Vec<String> = spaces.iter().map(|v| opts.fmt(*v)).collect();
    let last = rounded.iter().rposition(|v| v != "0")?;
    Some(rounded[..=last].join(" "))
}

/// `matrix(...)` transform attribute value.
pub fn matrix_attr(m: &Matrix, opts: &ConvertOptions) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        opts.fmt(m.a),
        opts.fmt(m.b),
        opts.fmt(m.c),
        opts.fmt(m.d),
        opts.fmt(m.e),
        opts.fmt(m.f)
    )
}
