//! Channel palette registry
//!
//! Loads channel palettes from palettes.json (embedded at compile time).
//! A palette assigns a display colour to each channel when more than three
//! channels are blended into one composite.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded palettes.json content
const PALETTES_JSON: &str = include_str!("../../palettes.json");

/// Default palette for blended composites
pub const DEFAULT_CHANNEL_PALETTE: &str = "CellPainting";

static PALETTE_REGISTRY: OnceLock<PaletteRegistry> = OnceLock::new();

/// Global palette registry, initialized lazily on first access
pub fn palette_registry() -> &'static PaletteRegistry {
    PALETTE_REGISTRY.get_or_init(|| {
        PaletteRegistry::from_json(PALETTES_JSON).unwrap_or_else(|e| {
            log::error!("Failed to load palettes.json: {}", e);
            PaletteRegistry::default()
        })
    })
}

/// A single palette definition from palettes.json
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteDefinition {
    pub name: String,
    pub colors: Vec<String>,
}

impl PaletteDefinition {
    /// Get a color by index (wraps around)
    pub fn get_color(&self, index: usize) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128];
        }
        let idx = index % self.colors.len();
        parse_hex_color(&self.colors[idx]).unwrap_or([128, 128, 128])
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Registry of all available palettes
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    /// Lowercase keys for case-insensitive lookup
    palettes: HashMap<String, PaletteDefinition>,
    names: Vec<String>,
}

impl PaletteRegistry {
    /// Load palettes from JSON string
    pub fn from_json(json: &str) -> Result<Self, String> {
        let definitions: Vec<PaletteDefinition> = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse palettes JSON: {}", e))?;

        let mut registry = Self::default();
        for def in definitions {
            registry.names.push(def.name.clone());
            registry.palettes.insert(def.name.to_lowercase(), def);
        }

        log::debug!("PaletteRegistry: loaded {} palettes", registry.palettes.len());
        Ok(registry)
    }

    /// Get a palette by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&PaletteDefinition> {
        self.palettes.get(&name.to_lowercase())
    }

    pub fn default_palette(&self) -> Option<&PaletteDefinition> {
        self.get(DEFAULT_CHANNEL_PALETTE)
    }

    /// Palette names in file order
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Parse a hex color string to RGB array
///
/// Supports `#RRGGBB`, `#RRGGBBAA` (alpha ignored) and both without `#`.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim_start_matches('#');

    if hex.len() != 6 && hex.len() != 8 {
        log::warn!("Invalid hex color length '{}': {}", hex, hex.len());
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some([r, g, b])
}

/// Colours for `n` channels from a named palette
///
/// Falls back to the default palette, then to grey, if the name is unknown.
pub fn channel_colors(palette_name: &str, n: usize) -> Vec<[u8; 3]> {
    let registry = palette_registry();
    match registry
        .get(palette_name)
        .or_else(|| registry.default_palette())
    {
        Some(palette) => (0..n).map(|i| palette.get_color(i)).collect(),
        None => vec![[128, 128, 128]; n],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("00FF00"), Some([0, 255, 0]));
        assert_eq!(parse_hex_color("#0000FFFF"), Some([0, 0, 255]));

        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("GGGGGG"), None);
    }

    #[test]
    fn test_palette_registry_loads() {
        let registry = palette_registry();
        assert!(registry.names().contains(&"RGB".to_string()));

        let rgb = registry.get("rgb").unwrap();
        assert_eq!(rgb.len(), 3);
        assert_eq!(rgb.get_color(0), [255, 0, 0]);
        assert_eq!(rgb.get_color(2), [0, 0, 255]);

        let cp = registry.default_palette().unwrap();
        assert_eq!(cp.len(), 5);
    }

    #[test]
    fn test_palette_color_wrapping() {
        let palette = palette_registry().get("CMY").unwrap();
        let len = palette.len();
        assert_eq!(palette.get_color(0), palette.get_color(len));
        assert_eq!(palette.get_color(1), palette.get_color(len + 1));
    }

    #[test]
    fn test_channel_colors_unknown_palette_uses_default() {
        let colors = channel_colors("no-such-palette", 5);
        let expected = channel_colors(DEFAULT_CHANNEL_PALETTE, 5);
        assert_eq!(colors, expected);
        assert_eq!(colors.len(), 5);
    }
}
