//! Color operators.
//!
//! Handles: CS, cs, SC, SCN, sc, scn, G, g, RG, rg, K, k
//!
//! Uppercase operators set the stroking color, lowercase the non-stroking
//! color. Inside uncolored tiling patterns and `d1` glyph procedures color
//! operators are ignored.

use smol_str::SmolStr;

use crate::interp::interpreter::PageInterpreter;
use crate::model::color::{ColorSpace, predefined_color_space};
use crate::model::objects::Operand;
use crate::model::resources::ResourceKind;
use crate::model::state::Paint;

/// Which paint a color operator targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Stroke,
    Fill,
}

impl PageInterpreter {
    /// Resolves a color space by name, falling back to DeviceGray.
    pub(crate) fn resolve_color_space(&mut self, name: &str) -> ColorSpace {
        if let Some(cs) = predefined_color_space(name) {
            return cs;
        }
        let resources = self.resources.clone();
        let found = match (&self.cache, resources.resource_key(ResourceKind::ColorSpace, name)) {
            (Some(cache), Some(key)) => cache.color_space(key, || resources.color_space(name)),
            _ => resources.color_space(name),
        };
        found.unwrap_or_else(|| {
            self.warn_once(format!("color space {} not found, using DeviceGray", name));
            ColorSpace::DeviceGray
        })
    }

    fn paint_mut(&mut self, target: Target) -> &mut Paint {
        match target {
            Target::Stroke => &mut self.gstate.stroke,
            Target::Fill => &mut self.gstate.fill,
        }
    }

    fn set_color_space(&mut self, target: Target, name: &str) {
        if self.color_locked {
            return;
        }
        let cs = self.resolve_color_space(name);
        let paint = self.paint_mut(target);
        paint.rgb = cs.initial_rgb();
        paint.components = vec![0.0; cs.components()];
        paint.color_space = cs;
        paint.pattern = None;
        self.text_style = None;
    }

    fn set_components(&mut self, target: Target, components: &[f64]) {
        if self.color_locked {
            return;
        }
        let paint = self.paint_mut(target);
        let Some(rgb) = paint.color_space.to_rgb(components) else {
            tracing::trace!(
                space = paint.color_space.name(),
                count = components.len(),
                "color component count mismatch"
            );
            return;
        };
        if paint.rgb == rgb && paint.pattern.is_none() && paint.components == components {
            return;
        }
        paint.rgb = rgb;
        paint.components = components.to_vec();
        paint.pattern = None;
        self.text_style = None;
    }

    fn set_device_color(&mut self, target: Target, cs: ColorSpace, components: &[f64]) {
        if self.color_locked {
            return;
        }
        let paint = self.paint_mut(target);
        if paint.color_space != cs {
            paint.color_space = cs;
        }
        self.set_components(target, components);
    }

    fn set_pattern(&mut self, target: Target, name: &str, components: &[f64]) {
        if self.color_locked {
            return;
        }
        let paint = self.paint_mut(target);
        if !paint.color_space.is_pattern() {
            paint.color_space = ColorSpace::Pattern(None);
        }
        // Uncolored patterns take their color from the components.
        if !components.is_empty()
            && let Some(rgb) = paint.color_space.to_rgb(components)
        {
            paint.rgb = rgb;
        }
        paint.components = components.to_vec();
        paint.pattern = Some(SmolStr::new(name));
        self.text_style = None;
    }

    /// Splits `SCN`/`scn` operands into components and a trailing pattern name.
    fn set_color_operands(&mut self, target: Target, operands: &[Operand]) {
        let components: Vec<f64> = operands.iter().filter_map(Operand::as_number).collect();
        match operands.last().and_then(Operand::as_name) {
            Some(name) => self.set_pattern(target, name, &components),
            None if components.len() == operands.len() => self.set_components(target, &components),
            None => tracing::trace!("malformed color operands skipped"),
        }
    }
}

#[allow(non_snake_case)]
impl PageInterpreter {
    /// Sets the stroking color space.
    ///
    /// PDF operator: `CS`
    pub fn do_CS(&mut self, name: &str) {
        self.set_color_space(Target::Stroke, name);
    }

    /// Sets the non-stroking color space.
    ///
    /// PDF operator: `cs`
    pub fn do_cs(&mut self, name: &str) {
        self.set_color_space(Target::Fill, name);
    }

    /// Sets the stroking color in the current color space.
    ///
    /// PDF operators: `SC`, `SCN`
    pub fn do_SC(&mut self, components: &[f64]) {
        self.set_components(Target::Stroke, components);
    }

    /// Sets the non-stroking color in the current color space.
    ///
    /// PDF operators: `sc`, `scn`
    pub fn do_sc(&mut self, components: &[f64]) {
        self.set_components(Target::Fill, components);
    }

    /// Selects a stroking pattern.
    ///
    /// PDF operator: `SCN` with a pattern name
    pub fn do_SCN_pattern(&mut self, name: &str, components: &[f64]) {
        self.set_pattern(Target::Stroke, name, components);
    }

    /// Selects a non-stroking pattern.
    ///
    /// PDF operator: `scn` with a pattern name
    pub fn do_scn_pattern(&mut self, name: &str, components: &[f64]) {
        self.set_pattern(Target::Fill, name, components);
    }

    /// PDF operator: `SCN` with components followed by a pattern name
    pub fn do_SCN_rest(&mut self, operands: &[Operand]) {
        self.set_color_operands(Target::Stroke, operands);
    }

    /// PDF operator: `scn` with components followed by a pattern name
    pub fn do_scn_rest(&mut self, operands: &[Operand]) {
        self.set_color_operands(Target::Fill, operands);
    }

    /// Sets the stroking color to a gray level.
    ///
    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: f64) {
        self.set_device_color(Target::Stroke, ColorSpace::DeviceGray, &[gray]);
    }

    /// Sets the non-stroking color to a gray level.
    ///
    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: f64) {
        self.set_device_color(Target::Fill, ColorSpace::DeviceGray, &[gray]);
    }

    /// Sets the stroking color to an RGB value.
    ///
    /// PDF operator: `RG`
    pub fn do_RG(&mut self, r: f64, g: f64, b: f64) {
        self.set_device_color(Target::Stroke, ColorSpace::DeviceRgb, &[r, g, b]);
    }

    /// Sets the non-stroking color to an RGB value.
    ///
    /// PDF operator: `rg`
    pub fn do_rg(&mut self, r: f64, g: f64, b: f64) {
        self.set_device_color(Target::Fill, ColorSpace::DeviceRgb, &[r, g, b]);
    }

    /// Sets the stroking color to a CMYK value.
    ///
    /// PDF operator: `K`
    pub fn do_K(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_device_color(Target::Stroke, ColorSpace::DeviceCmyk, &[c, m, y, k]);
    }

    /// Sets the non-stroking color to a CMYK value.
    ///
    /// PDF operator: `k`
    pub fn do_k(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.set_device_color(Target::Fill, ColorSpace::DeviceCmyk, &[c, m, y, k]);
    }
}
