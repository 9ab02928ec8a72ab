//! Node emission.
//!
//! Everything drawn ends up here: nodes get their paint attributes, are
//! wrapped for blend modes and soft masks, and are placed inside a clip group
//! unless the rectangle clip fast path proves the clip has no effect.

use std::sync::Arc;

use crate::geometry::{Matrix, Path, Rectangle};
use crate::interp::interpreter::PageInterpreter;
use crate::layout::text::matrix_attr;
use crate::model::color::Rgb;
use crate::model::resources::Image;
use crate::model::state::{LineCap, LineJoin, Paint};
use crate::output::defs::stable_id;
use crate::output::node::Node;

/// Image space to user space: images are drawn into the unit square with
/// the origin at the top-left corner.
const IMAGE_FLIP: Matrix = Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, 1.0);

/// SVG default for `stroke-miterlimit`.
const SVG_MITER_LIMIT: f64 = 4.0;

impl PageInterpreter {
    /// Appends a node without clip handling.
    pub(crate) fn push_raw(&mut self, node: Node) {
        self.content.push(node);
        self.open_clip = None;
    }

    /// Appends a drawn node under the current clip, blend mode and soft mask.
    ///
    /// `bounds` is the device-space extent of the node, used to skip clip
    /// wrappers that cannot change the result.
    pub(crate) fn append(&mut self, node: Node, bounds: Option<Rectangle>) {
        let node = self.apply_effects(node);
        let Some(clip) = self.gstate.clip else {
            self.push_raw(node);
            return;
        };
        if self.options.rect_clip_fast_path
            && let Some(rect) = self.clips.unnested_rect(clip)
            && let Some(b) = bounds
            && rect.contains(&b)
        {
            self.push_raw(node);
            return;
        }

        self.clips.mark_referenced(clip);
        if self.open_clip == Some(clip)
            && let Some(group) = self.content.last_mut()
        {
            group.children.push(node);
            return;
        }
        let group = Node::new("g")
            .attr("clip-path", format!("url(#{})", self.clips.id(clip)))
            .child(node);
        self.content.push(group);
        self.open_clip = Some(clip);
    }

    /// Wraps a node for the current blend mode and soft mask.
    pub(crate) fn apply_effects(&self, mut node: Node) -> Node {
        if let Some(mode) = &self.gstate.blend_mode {
            let style = format!("mix-blend-mode:{}", mode);
            node = if node.has_attr("style") || node.has_attr("mask") {
                Node::new("g").attr("style", style).child(node)
            } else {
                node.attr("style", style)
            };
        }
        if let Some(mask) = &self.gstate.soft_mask {
            node = Node::new("g")
                .attr("mask", format!("url(#{})", mask))
                .child(node);
        }
        node
    }

    /// CSS color of a paint, or a `url(#...)` reference for pattern paints.
    ///
    /// `node_transform` is the `transform` attribute of the painted node, if
    /// its geometry is not in device space.
    pub(crate) fn paint_value(&mut self, paint: &Paint, node_transform: Option<&Matrix>) -> String {
        match &paint.pattern {
            Some(name) => {
                let name = name.clone();
                self.pattern_paint(&name, paint, node_transform)
            }
            None => paint.rgb.to_css(),
        }
    }

    /// Sets fill attributes, omitting the SVG defaults.
    pub(crate) fn apply_fill(
        &mut self,
        node: &mut Node,
        even_odd: bool,
        node_transform: Option<&Matrix>,
    ) {
        let paint = self.gstate.fill.clone();
        let value = self.paint_value(&paint, node_transform);
        if value != "#000" {
            node.set_attr("fill", value);
        }
        if paint.alpha < 1.0 {
            node.set_attr("fill-opacity", self.options.fmt(paint.alpha));
        }
        if even_odd {
            node.set_attr("fill-rule", "evenodd");
        }
    }

    /// Stroke width in the units of the emitted geometry.
    ///
    /// Device-space geometry gets the width pre-scaled by the ctm; geometry
    /// kept in user space (under a non-uniform ctm) keeps the declared width.
    /// Hairlines are widened to `min_stroke_width` device units.
    pub(crate) fn stroke_width(&self, user_space: bool) -> f64 {
        let scale = self.gstate.ctm.mean_scale();
        let min = self.options.min_stroke_width;
        if user_space {
            let min = if scale > 0.0 { min / scale } else { min };
            self.gstate.line_width.max(min)
        } else {
            (self.gstate.line_width * scale).max(min)
        }
    }

    /// Sets stroke attributes, omitting the SVG defaults.
    pub(crate) fn apply_stroke(&mut self, node: &mut Node, node_transform: Option<&Matrix>) {
        let user_space = node_transform.is_some();
        let paint = self.gstate.stroke.clone();
        let value = self.paint_value(&paint, node_transform);
        let scale = if user_space {
            1.0
        } else {
            self.gstate.ctm.mean_scale()
        };
        let width = self.stroke_width(user_space);
        let o = &self.options;
        node.set_attr("stroke", value);
        if width != 1.0 {
            node.set_attr("stroke-width", o.fmt(width));
        }
        if paint.alpha < 1.0 {
            node.set_attr("stroke-opacity", o.fmt(paint.alpha));
        }
        if self.gstate.line_cap != LineCap::Butt {
            node.set_attr("stroke-linecap", self.gstate.line_cap.css());
        }
        match self.gstate.line_join {
            LineJoin::Miter => {
                if self.gstate.miter_limit != SVG_MITER_LIMIT {
                    node.set_attr("stroke-miterlimit", o.fmt(self.gstate.miter_limit.max(1.0)));
                }
            }
            join => node.set_attr("stroke-linejoin", join.css()),
        }
        let dash = &self.gstate.dash;
        if !dash.is_solid() {
            let array: Vec<String> = dash.array.iter().map(|v| o.fmt(v.abs() * scale)).collect();
            node.set_attr("stroke-dasharray", array.join(" "));
            if dash.phase != 0.0 {
                node.set_attr("stroke-dashoffset", o.fmt(dash.phase * scale));
            }
        }
    }

    /// Builds a `path` or `rect` node for device-space geometry. Stroked
    /// geometry only becomes a `rect` when its subpath is closed.
    pub(crate) fn shape_node(&self, device: &Path, stroke: bool) -> Node {
        let o = &self.options;
        let rect = if stroke {
            Rectangle::from_closed_path(device)
        } else {
            Rectangle::from_path(device)
        };
        match rect {
            Some(r) => Node::new("rect")
                .attr("x", o.fmt(r.x1))
                .attr("y", o.fmt(r.y1))
                .attr("width", o.fmt(r.width()))
                .attr("height", o.fmt(r.height())),
            None => Node::new("path").attr("d", device.to_data(o.precision)),
        }
    }

    /// Draws an image into the unit square of user space.
    pub(crate) fn draw_image(&mut self, image: &Arc<dyn Image>) {
        let m = IMAGE_FLIP.multiply(&self.gstate.ctm);
        let bounds = Rectangle::new(0.0, 0.0, 1.0, 1.0).to_path().transform(&m).bounds();
        let transform = matrix_attr(&m, &self.options);

        let url = match image.resolve_url() {
            Ok(url) => url,
            Err(e) => {
                self.warn_once(format!("image {} not drawn: {}", image.content_key(), e));
                self.draw_broken_image();
                return;
            }
        };
        let key = format!("{}|{}", image.content_key(), image.interpolate());
        let id = stable_id("img", &key);
        let interpolate = image.interpolate();
        self.defs.get_or_insert_with(&id, || {
            let mut node = Node::new("image")
                .attr("width", "1")
                .attr("height", "1")
                .attr("preserveAspectRatio", "none")
                .attr("href", url);
            if !interpolate {
                node.set_attr("image-rendering", "optimizeSpeed");
            }
            node
        });

        let node = if image.is_mask() {
            // Stencil masks paint the fill color through the image.
            let mask_id = stable_id("mask", &id);
            self.defs.get_or_insert_with(&mask_id, || {
                Node::new("mask")
                    .attr("maskContentUnits", "userSpaceOnUse")
                    .attr("style", "mask-type:alpha")
                    .child(Node::new("use").attr("href", format!("#{}", id)))
            });
            let mut rect = Node::new("rect")
                .attr("width", "1")
                .attr("height", "1")
                .attr("mask", format!("url(#{})", mask_id))
                .attr("transform", transform);
            self.apply_fill(&mut rect, false, Some(&m));
            rect
        } else {
            Node::new("use")
                .attr("href", format!("#{}", id))
                .attr("transform", transform)
        };
        self.append(node, bounds);
    }

    /// Draws the placeholder for an image that cannot be drawn.
    pub(crate) fn draw_broken_image(&mut self) {
        let m = IMAGE_FLIP.multiply(&self.gstate.ctm);
        let bounds = Rectangle::new(0.0, 0.0, 1.0, 1.0).to_path().transform(&m).bounds();
        let node = Node::new("rect")
            .attr("width", "1")
            .attr("height", "1")
            .attr("fill", Rgb::gray(0.8).to_css())
            .attr("stroke", Rgb::new(0.8, 0.0, 0.0).to_css())
            .attr("stroke-width", "0.01")
            .attr("class", "broken-image")
            .attr("transform", matrix_attr(&m, &self.options));
        self.append(node, bounds);
    }
}
