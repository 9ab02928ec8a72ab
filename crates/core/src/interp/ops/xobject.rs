//! XObject and marked content operators.
//!
//! Handles: Do, EI, BMC, BDC, EMC, MP, DP, BX, EX
//!
//! XObjects:
//! - Do: Invoke named XObject (Form or Image)
//!
//! Inline images arrive as a single `EI` operation carrying the image
//! dictionary and data collected by the parser from `BI ... ID ... EI`.
//!
//! Marked content:
//! - BMC: Begin marked content sequence
//! - BDC: Begin marked content with property dict
//! - EMC: End marked content sequence
//! - MP: Marked content point
//! - DP: Marked content point with property dict
//!
//! Soft masks referenced by `gs` are rendered here as well, since they are
//! transparency group forms.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::error::Result;
use crate::interp::interpreter::PageInterpreter;
use crate::model::color::Rgb;
use crate::model::objects::Operand;
use crate::model::resources::{Form, SoftMask, SoftMaskKind, XObject};
use crate::model::state::GraphicsState;
use crate::output::defs::stable_id;
use crate::output::node::Node;

impl PageInterpreter {
    /// Runs a form XObject under the current state.
    fn draw_form(&mut self, form: &Arc<Form>) -> Result<()> {
        if self.active_forms.contains(&form.id) {
            self.warn_once(format!("form {} references itself, skipped", form.id));
            return Ok(());
        }
        self.flush_text();

        let ctm = form.matrix.multiply(&self.gstate.ctm);
        let mut state = self.gstate.clone();
        state.ctm = ctm;
        // Effects wrap the form as a whole.
        state.blend_mode = None;
        state.soft_mask = None;
        if let Some(bbox) = form.bbox
            && let Some(clip) = self.form_bbox_clip(state.clip, &bbox, &ctm)
        {
            state.clip = Some(clip);
        }
        let resources = form
            .resources
            .clone()
            .unwrap_or_else(|| self.resources.clone());

        self.active_forms.push(form.id.clone());
        let result = self.run_nested_or_skip(state, resources, &form.content, self.color_locked);
        self.active_forms.pop();
        let Some(nodes) = result? else {
            return Ok(());
        };
        if nodes.is_empty() {
            return Ok(());
        }

        let effects = self.gstate.blend_mode.is_some() || self.gstate.soft_mask.is_some();
        if form.group.is_none() && !effects {
            for node in nodes {
                self.push_raw(node);
            }
            return Ok(());
        }
        let mut group = Node::new("g");
        if form.group.is_some_and(|g| g.isolated) {
            group.set_attr("style", "isolation:isolate");
        }
        group.children = nodes;
        let group = self.apply_effects(group);
        self.push_raw(group);
        Ok(())
    }

    /// Renders a soft mask group into a mask definition and returns its id.
    ///
    /// The group is drawn from the page's base transform, not the transform
    /// current at the `gs` operator.
    pub(crate) fn render_soft_mask(&mut self, mask: &Arc<SoftMask>) -> Result<Option<SmolStr>> {
        let group = &mask.group;
        let key = format!("{}|{:?}|{:?}", group.id, mask.kind, mask.backdrop);
        let id = stable_id("smask", &key);
        if self.defs.contains(&id) {
            return Ok(Some(id));
        }

        let ctm = group.matrix.multiply(&self.base_ctm);
        let mut state = GraphicsState::new(ctm);
        if let Some(bbox) = group.bbox {
            state.clip = self.form_bbox_clip(None, &bbox, &ctm);
        }
        let resources = group
            .resources
            .clone()
            .unwrap_or_else(|| self.resources.clone());
        let Some(nodes) = self.run_nested_or_skip(state, resources, &group.content, false)? else {
            return Ok(None);
        };

        let o = &self.options;
        let vp = self.viewport;
        let mut node = Node::new("mask")
            .attr("maskUnits", "userSpaceOnUse")
            .attr("x", o.fmt(vp.x1))
            .attr("y", o.fmt(vp.y1))
            .attr("width", o.fmt(vp.width()))
            .attr("height", o.fmt(vp.height()));
        match mask.kind {
            SoftMaskKind::Luminosity => {
                if let Some(backdrop) = mask.backdrop
                    && backdrop != Rgb::BLACK
                {
                    node.children.push(
                        Node::new("rect")
                            .attr("x", o.fmt(vp.x1))
                            .attr("y", o.fmt(vp.y1))
                            .attr("width", o.fmt(vp.width()))
                            .attr("height", o.fmt(vp.height()))
                            .attr("fill", backdrop.to_css()),
                    );
                }
            }
            SoftMaskKind::Alpha => node.set_attr("style", "mask-type:alpha"),
        }
        node.children.extend(nodes);
        tracing::debug!(mask = %id, "soft mask rendered");
        Ok(Some(self.defs.get_or_insert_with(&id, || node)))
    }
}

#[allow(non_snake_case)]
impl PageInterpreter {
    // ========================================================================
    // XObject Operators
    // ========================================================================

    /// Invokes a named XObject (image or form).
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, name: &str) -> Result<()> {
        let Some(xobject) = self.resources.xobject(name) else {
            self.warn_once(format!("xobject {} not found", name));
            return Ok(());
        };
        match xobject {
            XObject::Image(image) => {
                self.flush_text();
                self.draw_image(&image);
                Ok(())
            }
            XObject::Form(form) => self.draw_form(&form),
        }
    }

    /// Draws an inline image. Undecodable images leave a placeholder.
    ///
    /// PDF operator: `EI` (with `BI`/`ID` folded in by the parser)
    pub fn do_EI(&mut self, dict: Option<&Operand>, data: &[u8]) {
        let Some(dict) = dict.and_then(Operand::as_dict) else {
            tracing::trace!("inline image without dictionary skipped");
            return;
        };
        self.flush_text();
        match self.resources.inline_image(dict, data) {
            Some(image) => self.draw_image(&image),
            None => {
                self.warn_once("inline image could not be decoded".to_string());
                self.draw_broken_image();
            }
        }
    }

    // ========================================================================
    // Marked Content Operators
    // ========================================================================

    /// PDF operator: `BMC`
    pub fn do_BMC(&mut self, tag: &str) {
        self.marked_depth += 1;
        tracing::trace!(tag, depth = self.marked_depth, "begin marked content");
    }

    /// Begins marked content with a property list, given inline or by name.
    ///
    /// PDF operator: `BDC`
    pub fn do_BDC(&mut self, tag: &str, props: Option<&Operand>) {
        self.marked_depth += 1;
        let properties = match props {
            Some(Operand::Name(name)) => self.resources.properties(name).map(|p| p.len()),
            Some(Operand::Dict(dict)) => Some(dict.len()),
            _ => None,
        };
        tracing::trace!(tag, depth = self.marked_depth, ?properties, "begin marked content");
    }

    /// Ends marked content. Unbalanced `EMC` is ignored.
    ///
    /// PDF operator: `EMC`
    pub fn do_EMC(&mut self) {
        match self.marked_depth.checked_sub(1) {
            Some(depth) => self.marked_depth = depth,
            None => tracing::trace!("unbalanced EMC ignored"),
        }
    }

    /// PDF operator: `MP`
    pub fn do_MP(&mut self, tag: &str) {
        tracing::trace!(tag, "marked content point");
    }

    /// PDF operator: `DP`
    pub fn do_DP(&mut self, tag: &str, props: Option<&Operand>) {
        tracing::trace!(tag, has_properties = props.is_some(), "marked content point");
    }

    /// Begins a compatibility section. Unknown operators are skipped
    /// everywhere, so this has no effect.
    ///
    /// PDF operator: `BX`
    pub fn do_BX(&mut self) {}

    /// PDF operator: `EX`
    pub fn do_EX(&mut self) {}
}
