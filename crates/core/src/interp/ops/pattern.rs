//! Shading operator and pattern paints.
//!
//! Handles: sh
//!
//! Pattern color spaces reference definitions instead of colors:
//! - shading patterns become `linearGradient`/`radialGradient` elements;
//! - tiling patterns run their cell content once into a `pattern` element.
//!
//! Pattern space is anchored to the page: the pattern matrix maps it to the
//! default user space of the page, so placement uses the base transform
//! rather than the current one.

use smol_str::SmolStr;

use crate::geometry::{Matrix, Path};
use crate::interp::interpreter::PageInterpreter;
use crate::layout::text::matrix_attr;
use crate::model::color::Rgb;
use crate::model::resources::{Pattern, Shading, ShadingKind, TilingPattern};
use crate::model::state::{GraphicsState, Paint};
use crate::output::defs::stable_id;
use crate::output::node::Node;

/// Resolved pattern paint.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PatternPaint {
    /// Definition id of a gradient or pattern element.
    Ref(SmolStr),
    /// Solid approximation, for patterns that cannot be expressed.
    Solid(Rgb),
}

impl PatternPaint {
    pub(crate) fn css(&self) -> String {
        match self {
            Self::Ref(id) => format!("url(#{})", id),
            Self::Solid(rgb) => rgb.to_css(),
        }
    }
}

impl PageInterpreter {
    /// CSS paint value for a pattern paint.
    pub(crate) fn pattern_paint(
        &mut self,
        name: &str,
        paint: &Paint,
        node_transform: Option<&Matrix>,
    ) -> String {
        self.pattern_ref(name, paint, node_transform).css()
    }

    /// Resolves the pattern `name` to a definition.
    ///
    /// `node_transform` is the transform of the painted node; pattern space
    /// is expressed relative to it.
    pub(crate) fn pattern_ref(
        &mut self,
        name: &str,
        paint: &Paint,
        node_transform: Option<&Matrix>,
    ) -> PatternPaint {
        let Some(pattern) = self.resources.pattern(name) else {
            self.warn_once(format!("pattern {} not found", name));
            return PatternPaint::Solid(paint.rgb);
        };
        let (matrix, fallback) = match &pattern {
            Pattern::Shading(sp) => (sp.matrix, sp.shading.average_color()),
            Pattern::Tiling(tp) => (tp.matrix, paint.rgb),
        };
        let mut placement = matrix.multiply(&self.base_ctm);
        if let Some(node) = node_transform {
            match node.invert() {
                Ok(inv) => placement = placement.multiply(&inv),
                Err(e) => {
                    tracing::debug!(pattern = name, error = %e, "pattern placement skipped");
                    return PatternPaint::Solid(fallback);
                }
            }
        }
        match pattern {
            Pattern::Shading(sp) => match self.gradient_def(&sp.shading, &placement) {
                Some(id) => PatternPaint::Ref(id),
                None => PatternPaint::Solid(fallback),
            },
            Pattern::Tiling(tp) => match self.tiling_def(&tp, &placement, paint) {
                Some(id) => PatternPaint::Ref(id),
                None => PatternPaint::Solid(fallback),
            },
        }
    }

    /// Adds a gradient for `shading` in the space mapped by `transform`.
    /// Returns `None` for shading types without a gradient equivalent.
    pub(crate) fn gradient_def(
        &mut self,
        shading: &Shading,
        transform: &Matrix,
    ) -> Option<SmolStr> {
        let o = &self.options;
        let mut node = match &shading.kind {
            ShadingKind::Axial { coords, .. } => Node::new("linearGradient")
                .attr("x1", o.fmt(coords[0]))
                .attr("y1", o.fmt(coords[1]))
                .attr("x2", o.fmt(coords[2]))
                .attr("y2", o.fmt(coords[3])),
            ShadingKind::Radial { coords, .. } => Node::new("radialGradient")
                .attr("fx", o.fmt(coords[0]))
                .attr("fy", o.fmt(coords[1]))
                .attr("fr", o.fmt(coords[2]))
                .attr("cx", o.fmt(coords[3]))
                .attr("cy", o.fmt(coords[4]))
                .attr("r", o.fmt(coords[5])),
            ShadingKind::Unsupported(kind) => {
                tracing::debug!(
                    kind,
                    shading = %shading.id,
                    "shading approximated by its average color"
                );
                return None;
            }
        };
        if shading.stops.is_empty() {
            return None;
        }
        node.set_attr("gradientUnits", "userSpaceOnUse");
        if !transform.is_identity() {
            node.set_attr("gradientTransform", matrix_attr(transform, o));
        }
        for stop in &shading.stops {
            node.children.push(
                Node::new("stop")
                    .attr("offset", o.fmt(stop.offset.clamp(0.0, 1.0)))
                    .attr("stop-color", stop.color.to_css()),
            );
        }
        let key = format!("{}|{:?}", shading.id, node);
        let id = stable_id("grad", &key);
        Some(self.defs.get_or_insert_with(&id, || node))
    }

    /// Renders a tiling pattern cell into a pattern definition.
    fn tiling_def(
        &mut self,
        tp: &TilingPattern,
        placement: &Matrix,
        paint: &Paint,
    ) -> Option<SmolStr> {
        if tp.x_step == 0.0 || tp.y_step == 0.0 {
            return None;
        }
        let o = &self.options;
        let transform = matrix_attr(placement, o);
        let color = if tp.uncolored {
            paint.rgb.to_css()
        } else {
            String::new()
        };
        let id = stable_id("pat", &format!("{}|{}|{}", tp.id, transform, color));
        if self.defs.contains(&id) {
            return Some(id);
        }

        let mut state = GraphicsState::new(Matrix::IDENTITY);
        if tp.uncolored {
            state.fill.rgb = paint.rgb;
            state.stroke.rgb = paint.rgb;
        }
        let resources = tp.resources.clone().unwrap_or_else(|| self.resources.clone());
        let nodes = match self.run_nested_or_skip(state, resources, &tp.content, tp.uncolored) {
            Ok(Some(nodes)) => nodes,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(pattern = %tp.id, error = %e, "pattern cell not rendered");
                return None;
            }
        };

        let o = &self.options;
        let mut node = Node::new("pattern")
            .attr("patternUnits", "userSpaceOnUse")
            .attr("x", o.fmt(tp.bbox.x1))
            .attr("y", o.fmt(tp.bbox.y1))
            .attr("width", o.fmt(tp.x_step.abs()))
            .attr("height", o.fmt(tp.y_step.abs()))
            .attr("patternTransform", transform);
        node.children = nodes;
        Some(self.defs.get_or_insert_with(&id, || node))
    }
}

#[allow(non_snake_case)]
impl PageInterpreter {
    /// Paints a shading over the current clip region.
    ///
    /// PDF operator: `sh`
    pub fn do_sh(&mut self, name: &str) {
        let Some(shading) = self.resources.shading(name) else {
            self.warn_once(format!("shading {} not found", name));
            return;
        };
        self.flush_text();
        let ctm = self.gstate.ctm;

        let device: Path = match shading.bbox {
            Some(bbox) => bbox.to_path().transform(&ctm),
            None => {
                let area = self
                    .gstate
                    .clip
                    .and_then(|c| self.clips.unnested_rect(c))
                    .unwrap_or(self.viewport);
                area.to_path()
            }
        };
        let bounds = device.bounds();
        let mut node = self.shape_node(&device, false);
        match self.gradient_def(&shading, &ctm) {
            Some(id) => node.set_attr("fill", format!("url(#{})", id)),
            None => node.set_attr("fill", shading.average_color().to_css()),
        }
        self.append(node, bounds);
    }
}
