//! Colors and color spaces.
//!
//! Sample-to-RGB conversion for anything beyond the device spaces is supplied
//! by the embedding application through [`ColorConverter`].

use smol_str::SmolStr;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn gray(g: f64) -> Self {
        let g = clamp_unit(g);
        Self::new(g, g, g)
    }

    /// Naive CMYK conversion, as used by most viewers for uncalibrated CMYK.
    pub fn from_cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        let k = clamp_unit(k);
        Self::new(
            (1.0 - clamp_unit(c)) * (1.0 - k),
            (1.0 - clamp_unit(m)) * (1.0 - k),
            (1.0 - clamp_unit(y)) * (1.0 - k),
        )
    }

    /// Relative luminance (Rec. 601 weights), used for luminosity masks.
    pub fn luminance(&self) -> f64 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    /// Shortest CSS color notation: `#rgb` when possible, else `#rrggbb`.
    pub fn to_css(&self) -> String {
        let [r, g, b] = [self.r, self.g, self.b].map(|c| (clamp_unit(c) * 255.0).round() as u8);
        if r >> 4 == r & 0xf && g >> 4 == g & 0xf && b >> 4 == b & 0xf {
            format!("#{:x}{:x}{:x}", r & 0xf, g & 0xf, b & 0xf)
        } else {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Converts color samples of a non-device color space to RGB.
pub trait ColorConverter: Send + Sync + fmt::Debug {
    /// Color space name, used in traces.
    fn name(&self) -> &str;

    /// Number of color components.
    fn components(&self) -> usize;

    fn to_rgb(&self, components: &[f64]) -> Rgb;

    /// Initial color components set by `CS`/`cs`.
    fn initial_color(&self) -> Vec<f64> {
        vec![0.0; self.components()]
    }
}

/// A color space as seen by the interpreter.
#[derive(Debug, Clone)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    /// Pattern color space, with the underlying space for uncolored patterns.
    Pattern(Option<Box<ColorSpace>>),
    /// Any other color space, converted by the embedding application.
    Custom(Arc<dyn ColorConverter>),
}

impl PartialEq for ColorSpace {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DeviceGray, Self::DeviceGray)
            | (Self::DeviceRgb, Self::DeviceRgb)
            | (Self::DeviceCmyk, Self::DeviceCmyk) => true,
            (Self::Pattern(a), Self::Pattern(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for ColorSpace {
    fn default() -> Self {
        Self::DeviceGray
    }
}

impl ColorSpace {
    pub fn name(&self) -> &str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
            Self::Pattern(_) => "Pattern",
            Self::Custom(c) => c.name(),
        }
    }

    /// Number of color components. Pattern spaces report the components of
    /// the underlying space (zero for colored patterns).
    pub fn components(&self) -> usize {
        match self {
            Self::DeviceGray => 1,
            Self::DeviceRgb => 3,
            Self::DeviceCmyk => 4,
            Self::Pattern(base) => base.as_ref().map_or(0, |b| b.components()),
            Self::Custom(c) => c.components(),
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }

    /// Initial color of the space, as set by `CS`/`cs`.
    pub fn initial_rgb(&self) -> Rgb {
        match self {
            Self::DeviceCmyk => Rgb::from_cmyk(0.0, 0.0, 0.0, 1.0),
            Self::Custom(c) => c.to_rgb(&c.initial_color()),
            Self::Pattern(Some(base)) => base.initial_rgb(),
            _ => Rgb::BLACK,
        }
    }

    /// Converts color components to RGB.
    ///
    /// Returns `None` when the component count does not match the space.
    pub fn to_rgb(&self, components: &[f64]) -> Option<Rgb> {
        match (self, components) {
            (Self::DeviceGray, [g]) => Some(Rgb::gray(*g)),
            (Self::DeviceRgb, [r, g, b]) => Some(Rgb::new(
                clamp_unit(*r),
                clamp_unit(*g),
                clamp_unit(*b),
            )),
            (Self::DeviceCmyk, [c, m, y, k]) => Some(Rgb::from_cmyk(*c, *m, *y, *k)),
            (Self::Pattern(Some(base)), _) => base.to_rgb(components),
            (Self::Custom(conv), c) if c.len() == conv.components() => Some(conv.to_rgb(c)),
            _ => None,
        }
    }
}

/// Predefined color spaces, resolvable by name without a resource lookup.
pub static PREDEFINED_COLORSPACE: LazyLock<HashMap<&'static str, ColorSpace>> =
    LazyLock::new(|| {
        HashMap::from([
            ("DeviceGray", ColorSpace::DeviceGray),
            ("DeviceRGB", ColorSpace::DeviceRgb),
            ("DeviceCMYK", ColorSpace::DeviceCmyk),
            ("Pattern", ColorSpace::Pattern(None)),
        ])
    });

/// Inline image color space abbreviations.
pub static INLINE_COLORSPACE_ABBREV: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        HashMap::from([
            ("G", "DeviceGray"),
            ("RGB", "DeviceRGB"),
            ("CMYK", "DeviceCMYK"),
        ])
    });

/// Looks up a predefined color space, accepting inline image abbreviations.
pub fn predefined_color_space(name: &str) -> Option<ColorSpace> {
    let name = INLINE_COLORSPACE_ABBREV.get(name).copied().unwrap_or(name);
    PREDEFINED_COLORSPACE.get(name).cloned()
}

/// Blend mode names as they appear in CSS `mix-blend-mode`.
pub fn css_blend_mode(pdf_name: &str) -> Option<SmolStr> {
    let css = match pdf_name {
        "Multiply" => "multiply",
        "Screen" => "screen",
        "Overlay" => "overlay",
        "Darken" => "darken",
        "Lighten" => "lighten",
        "ColorDodge" => "color-dodge",
        "ColorBurn" => "color-burn",
        "HardLight" => "hard-light",
        "SoftLight" => "soft-light",
        "Difference" => "difference",
        "Exclusion" => "exclusion",
        "Hue" => "hue",
        "Saturation" => "saturation",
        "Color" => "color",
        "Luminosity" => "luminosity",
        _ => return None,
    };
    Some(SmolStr::new_static(css))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_short_form() {
        assert_eq!(Rgb::BLACK.to_css(), "#000");
        assert_eq!(Rgb::new(1.0, 0.0, 0.0).to_css(), "#f00");
        assert_eq!(Rgb::new(0.5, 0.0, 0.0).to_css(), "#800000");
    }

    #[test]
    fn test_device_conversion() {
        assert_eq!(ColorSpace::DeviceGray.to_rgb(&[1.0]), Some(Rgb::WHITE));
        assert_eq!(
            ColorSpace::DeviceCmyk.to_rgb(&[0.0, 0.0, 0.0, 1.0]),
            Some(Rgb::BLACK)
        );
        assert_eq!(ColorSpace::DeviceRgb.to_rgb(&[1.0]), None);
    }

    #[test]
    fn test_inline_abbreviation() {
        assert_eq!(predefined_color_space("RGB"), Some(ColorSpace::DeviceRgb));
        assert_eq!(predefined_color_space("Lab"), None);
    }
}
