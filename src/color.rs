//! Color specification parsing.
//!
//! A color spec is a named color (`"light purple"`), a hex code (`"#dda0dd"`,
//! `"#fab"`) or a comma separated triple (`"221, 160, 221"`). Resolution never
//! fails: anything unparseable becomes white and is reported through the log.

use std::collections::HashMap;
use lazy_static::lazy_static;

use crate::error::{MoodError, Result};
use crate::models::ColorRgb;

/// Named colors, in lookup order for partial matches.
pub const NAMED_COLORS: &[(&str, ColorRgb)] = &[
    // Basic colors
    ("red", ColorRgb::new(255, 0, 0)),
    ("green", ColorRgb::new(0, 255, 0)),
    ("blue", ColorRgb::new(0, 0, 255)),
    ("yellow", ColorRgb::new(255, 255, 0)),
    ("purple", ColorRgb::new(128, 0, 128)),
    ("orange", ColorRgb::new(255, 165, 0)),
    ("white", ColorRgb::new(255, 255, 255)),
    ("black", ColorRgb::new(0, 0, 0)),
    ("grey", ColorRgb::new(128, 128, 128)),
    ("gray", ColorRgb::new(128, 128, 128)),
    ("pink", ColorRgb::new(255, 192, 203)),
    ("cyan", ColorRgb::new(0, 255, 255)),
    ("magenta", ColorRgb::new(255, 0, 255)),
    // Weather shades
    ("light purple", ColorRgb::new(221, 160, 221)),
    ("dark purple", ColorRgb::new(72, 61, 139)),
    ("light blue", ColorRgb::new(173, 216, 230)),
    ("dark blue", ColorRgb::new(0, 0, 139)),
    ("light grey", ColorRgb::new(211, 211, 211)),
    ("light gray", ColorRgb::new(211, 211, 211)),
    ("dark grey", ColorRgb::new(169, 169, 169)),
    ("dark gray", ColorRgb::new(169, 169, 169)),
    ("warm white", ColorRgb::new(255, 239, 213)),
    ("cool white", ColorRgb::new(248, 248, 255)),
    ("warm yellow", ColorRgb::new(255, 223, 0)),
    ("light orange", ColorRgb::new(255, 204, 153)),
    ("dark orange", ColorRgb::new(255, 140, 0)),
    // Sky
    ("sky blue", ColorRgb::new(135, 206, 235)),
    ("storm grey", ColorRgb::new(112, 128, 144)),
    ("storm gray", ColorRgb::new(112, 128, 144)),
    ("rain blue", ColorRgb::new(100, 149, 237)),
    ("snow white", ColorRgb::new(255, 250, 250)),
    ("sunshine yellow", ColorRgb::new(255, 215, 0)),
    ("overcast grey", ColorRgb::new(128, 128, 128)),
    ("overcast gray", ColorRgb::new(128, 128, 128)),
];

lazy_static! {
    static ref NAMED_INDEX: HashMap<&'static str, ColorRgb> =
        NAMED_COLORS.iter().copied().collect();
}

/// The named-color table, for listing in the CLI.
pub fn named_colors() -> &'static [(&'static str, ColorRgb)] {
    NAMED_COLORS
}

/// Resolves a color spec to an RGB triple, falling back to white.
pub fn resolve(spec: &str) -> ColorRgb {
    let color = spec.trim().to_lowercase();
    if color.is_empty() {
        log::warn!("Empty color string, using default white");
        return ColorRgb::WHITE;
    }

    match try_resolve(&color) {
        Ok(rgb) => rgb,
        Err(e) => {
            log::warn!("{}, using default white", e);
            ColorRgb::WHITE
        }
    }
}

/// Like [`resolve`], but says why a color spec could not be parsed.
///
/// Expects input already trimmed and lower-cased.
fn try_resolve(color: &str) -> Result<ColorRgb> {
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| MoodError::UnresolvableColor(color.to_string()));
    }

    if color.contains(',') {
        return parse_triple(color).ok_or_else(|| MoodError::UnresolvableColor(color.to_string()));
    }

    if let Some(rgb) = NAMED_INDEX.get(color) {
        log::debug!("Parsed color '{}' as {}", color, rgb);
        return Ok(*rgb);
    }

    // Compound names: "purple light" should still find a purple.
    NAMED_COLORS.iter()
        .find(|(name, _)| name.contains(color) || color.contains(name))
        .map(|(name, rgb)| {
            log::debug!("Partial match for '{}' -> '{}' as {}", color, name, rgb);
            *rgb
        })
        .ok_or_else(|| MoodError::UnresolvableColor(color.to_string()))
}

fn parse_hex(hex: &str) -> Option<ColorRgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };
    if expanded.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
    let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
    let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
    Some(ColorRgb::new(r, g, b))
}

fn parse_triple(rgb: &str) -> Option<ColorRgb> {
    let parts: Vec<&str> = rgb.split(',').map(|s| s.trim()).collect();
    if parts.len() != 3 {
        return None;
    }

    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        let value: i64 = part.parse().ok()?;
        *slot = u8::try_from(value).ok()?;
    }
    Some(ColorRgb::new(channels[0], channels[1], channels[2]))
}
