//! Hierarchical style resolution.
//!
//! DESIGN
//! ======
//! Every element carries an [`ElementStyle`]: a few values of its own plus a
//! comma-separated `parent_key` chain into the output's [`StyleModel`]. A
//! property lookup walks that graph depth-first with an explicit stack. Parent
//! keys are pushed in declared order and popped last-first, so with several
//! parents the last declared one is consulted first. Servers rely on that
//! order, so it is kept as is.
//!
//! Two sibling-key conventions refine plain lookups:
//! - `<property>-factor` multiplies the numeric base value of `<property>`.
//! - `<property>-blend` is a color composited over the base color.
//!
//! Each of those is taken from the first node that defines it, independently
//! of where the base value was found.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;

use wire::{ElementStyle, StyleModel, StyleValue};

// ── Property names ──────────────────────────────────────────────

pub const BACKGROUND_COLOR: &str = "background-color";
pub const COLOR: &str = "color";
pub const HEIGHT: &str = "height";
pub const OPACITY: &str = "opacity";
pub const BORDER_WIDTH: &str = "border-width";
pub const BORDER_COLOR: &str = "border-color";

const FACTOR_SUFFIX: &str = "-factor";
const BLEND_SUFFIX: &str = "-blend";

/// Light gray used for gap states and unstyled elements.
pub const GAP_COLOR: u32 = 0x00CA_CACA;

/// The style given to synthesized gap states when their entry has none.
#[must_use]
pub fn default_gap_style() -> ElementStyle {
    ElementStyle::default()
        .with(BACKGROUND_COLOR, "#CACACA")
        .with(HEIGHT, 1.0)
}

// =============================================================================
// COLOR
// =============================================================================

/// A packed 24-bit RGB color with a separate alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: u32,
    pub alpha: f64,
}

impl Rgba {
    #[must_use]
    pub fn new(rgb: u32, alpha: f64) -> Self {
        Self { rgb: rgb & 0x00FF_FFFF, alpha: alpha.clamp(0.0, 1.0) }
    }

    #[must_use]
    pub fn opaque(rgb: u32) -> Self {
        Self::new(rgb, 1.0)
    }

    #[must_use]
    pub fn red(self) -> u32 {
        (self.rgb >> 16) & 0xFF
    }

    #[must_use]
    pub fn green(self) -> u32 {
        (self.rgb >> 8) & 0xFF
    }

    #[must_use]
    pub fn blue(self) -> u32 {
        self.rgb & 0xFF
    }

    /// Parse `#RRGGBB`, `#RRGGBBAA`, `#RGB`, `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(hex) = raw.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = raw.to_ascii_lowercase();
        if let Some(body) = lower.strip_prefix("rgba(").and_then(|s| s.strip_suffix(')')) {
            return parse_components(body, true);
        }
        if let Some(body) = lower.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
            return parse_components(body, false);
        }
        None
    }

    /// Composite `overlay` over `self`, alpha-aware.
    ///
    /// With `self = (c1, a1)` and `overlay = (c2, a2)`, the combined alpha is
    /// `a1 + a2 - a1*a2` and each 8-bit channel is
    /// `floor(a1*(1-a2)*v1 + a2*v2) / a`, truncated.
    #[must_use]
    pub fn blend(self, overlay: Self) -> Self {
        let (a1, a2) = (self.alpha, overlay.alpha);
        let alpha = a1 + a2 - a1 * a2;
        if alpha <= 0.0 {
            return Self::new(0, 0.0);
        }

        let mix = |v1: u32, v2: u32| -> u32 {
            let weighted = (a1 * (1.0 - a2) * f64::from(v1) + a2 * f64::from(v2)).floor();
            channel_from_f64(weighted / alpha)
        };

        let rgb = (mix(self.red(), overlay.red()) << 16)
            | (mix(self.green(), overlay.green()) << 8)
            | mix(self.blue(), overlay.blue());
        Self::new(rgb, alpha)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}@{:.2}", self.rgb, self.alpha)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_from_f64(value: f64) -> u32 {
    value.clamp(0.0, 255.0) as u32
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let short = u32::from_str_radix(hex, 16).ok()?;
            let r = (short >> 8) & 0xF;
            let g = (short >> 4) & 0xF;
            let b = short & 0xF;
            Some(Rgba::opaque(((r * 0x11) << 16) | ((g * 0x11) << 8) | (b * 0x11)))
        }
        6 => Some(Rgba::opaque(u32::from_str_radix(hex, 16).ok()?)),
        8 => {
            let packed = u32::from_str_radix(hex, 16).ok()?;
            Some(Rgba::new(packed >> 8, f64::from(packed & 0xFF) / 255.0))
        }
        _ => None,
    }
}

fn parse_components(body: &str, with_alpha: bool) -> Option<Rgba> {
    let parts = body.split(',').map(str::trim).collect::<Vec<_>>();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }
    let mut rgb = 0u32;
    for part in &parts[..3] {
        let channel = part.parse::<u8>().ok()?;
        rgb = (rgb << 8) | u32::from(channel);
    }
    let alpha = if with_alpha { parts[3].parse::<f64>().ok()? } else { 1.0 };
    Some(Rgba::new(rgb, alpha))
}

// =============================================================================
// RESOLVED STYLE
// =============================================================================

/// The only style shape handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStyle {
    pub color: Rgba,
    pub height: f64,
    pub border_width: f64,
    pub border_color: Rgba,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            color: Rgba::opaque(GAP_COLOR),
            height: 1.0,
            border_width: 0.0,
            border_color: Rgba::opaque(0),
        }
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Read-only property lookups over one output's style model.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    model: &'a StyleModel,
}

impl<'a> StyleResolver<'a> {
    #[must_use]
    pub fn new(model: &'a StyleModel) -> Self {
        Self { model }
    }

    /// First value of `property` found along the inheritance walk.
    #[must_use]
    pub fn get_value(&self, style: &ElementStyle, property: &str) -> Option<StyleValue> {
        let mut found = None;
        self.walk(style, |values| match values.get(property) {
            Some(value) => {
                found = Some(value.clone());
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        });
        found
    }

    /// Numeric value of `property`, scaled by the first `<property>-factor` in the chain.
    #[must_use]
    pub fn get_number(&self, style: &ElementStyle, property: &str) -> Option<f64> {
        let factor_key = format!("{property}{FACTOR_SUFFIX}");
        let mut base = None;
        let mut factor = None;

        self.walk(style, |values| {
            if base.is_none() {
                base = values.get(property).and_then(StyleValue::as_number);
            }
            if factor.is_none() {
                factor = values.get(&factor_key).and_then(StyleValue::as_number);
            }
            if base.is_some() && factor.is_some() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        match (base, factor) {
            (Some(base), Some(factor)) => Some(base * factor),
            (Some(value), None) | (None, Some(value)) => Some(value),
            (None, None) => None,
        }
    }

    /// Color of `property` with the global opacity applied and any
    /// `<property>-blend` modifier composited over it.
    #[must_use]
    pub fn get_color(&self, style: &ElementStyle, property: &str) -> Option<Rgba> {
        let blend_key = format!("{property}{BLEND_SUFFIX}");
        let mut blend = None;
        let mut opacity = None;
        let mut color = None;

        self.walk(style, |values| {
            if blend.is_none() {
                blend = text_color(values, &blend_key);
            }
            if opacity.is_none() {
                opacity = values.get(OPACITY).and_then(StyleValue::as_number);
            }
            if color.is_none() {
                color = text_color(values, property);
            }
            if opacity.is_some() && color.is_some() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        if color.is_none() && opacity.is_none() {
            return None;
        }
        let base = Rgba::new(color.map_or(0, |c| c.rgb), opacity.unwrap_or(1.0));
        Some(blend.map_or(base, |overlay| base.blend(overlay)))
    }

    /// Resolve the renderer-facing style of an element.
    #[must_use]
    pub fn resolve(&self, style: &ElementStyle) -> ResolvedStyle {
        let fallback = ResolvedStyle::default();
        ResolvedStyle {
            color: self.get_color(style, BACKGROUND_COLOR).unwrap_or(fallback.color),
            height: self.get_number(style, HEIGHT).unwrap_or(fallback.height),
            border_width: self.get_number(style, BORDER_WIDTH).unwrap_or(fallback.border_width),
            border_color: self.get_color(style, BORDER_COLOR).unwrap_or(fallback.border_color),
        }
    }

    /// Resolve a style-model entry by key.
    #[must_use]
    pub fn resolve_key(&self, key: &str) -> ResolvedStyle {
        self.resolve(&ElementStyle::inherit(key))
    }

    /// Depth-first walk over `start` and its ancestors. Each style-model key
    /// is visited at most once, so cyclic parent chains terminate.
    fn walk<'s, F>(&'s self, start: &'s ElementStyle, mut visit: F)
    where
        F: FnMut(&BTreeMap<String, StyleValue>) -> ControlFlow<()>,
    {
        let mut stack = Vec::<&'s str>::new();
        let mut visited = HashSet::<&'s str>::new();
        let mut current = Some(start);

        while let Some(style) = current {
            if visit(&style.values).is_break() {
                return;
            }
            stack.extend(style.parent_keys());

            current = None;
            while let Some(key) = stack.pop() {
                if !visited.insert(key) {
                    continue;
                }
                if let Some(next) = self.model.styles.get(key) {
                    current = Some(next);
                    break;
                }
            }
        }
    }
}

fn text_color(values: &BTreeMap<String, StyleValue>, key: &str) -> Option<Rgba> {
    values.get(key).and_then(StyleValue::as_text).and_then(Rgba::parse)
}
