//! Theme documents (JSON) and their terminal colours: hex → ratatui Color, One Dark fallbacks.

use crate::Palette;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Styling descriptor served by the data source. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub app_background_color: String,
    #[serde(default)]
    pub font_color: String,
    #[serde(default)]
    pub tile_background_color_primary: String,
    #[serde(default)]
    pub tile_background_color_secondary: String,
    #[serde(default)]
    pub layer_groups: Vec<LayerGroup>,
}

/// A visual category; a generated tile carries at most one variant per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerGroup {
    pub name: String,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    #[serde(default)]
    pub svg: String,
}

impl Theme {
    /// Position of a layer group in the theme, used to pick its colour.
    pub fn group_index(&self, group_name: &str) -> Option<usize> {
        self.layer_groups.iter().position(|g| g.name == group_name)
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Terminal colours resolved from an optional theme. Missing or invalid values fall back to One Dark.
#[derive(Debug, Clone)]
pub struct Colors {
    /// Layer group colours (index 0..=5): green, yellow, red, blue, magenta, cyan.
    pub groups: [Color; 6],
    pub app_bg: Color,
    pub font: Color,
    pub tile_primary: Color,
    pub tile_secondary: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Highlight / titles.
    pub title: Color,
    pub inactive_fg: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Colors {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            groups: [
                Color::Rgb(0x98, 0xC3, 0x79),
                Color::Rgb(0xE5, 0xC0, 0x7B),
                Color::Rgb(0xE0, 0x6C, 0x75),
                Color::Rgb(0x61, 0xAF, 0xEF),
                Color::Rgb(0xC6, 0x78, 0xDD),
                Color::Rgb(0x56, 0xB6, 0xC2),
            ],
            app_bg: Color::Rgb(0x28, 0x2C, 0x34),
            font: Color::Rgb(0xAB, 0xB2, 0xBF),
            tile_primary: Color::Rgb(0x31, 0x35, 0x3F),
            tile_secondary: Color::Rgb(0x3A, 0x3F, 0x4B),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Colours for `theme` (or defaults when it has not loaded), with `palette` applied.
    pub fn resolve(theme: Option<&Theme>, palette: Palette) -> Self {
        let mut colors = Self::onedark_default();
        if let Some(theme) = theme {
            let get = |value: &str, fallback: Color| parse_hex(value).unwrap_or(fallback);
            colors.app_bg = get(&theme.app_background_color, colors.app_bg);
            colors.font = get(&theme.font_color, colors.font);
            colors.tile_primary = get(&theme.tile_background_color_primary, colors.tile_primary);
            colors.tile_secondary =
                get(&theme.tile_background_color_secondary, colors.tile_secondary);
        }
        colors.apply_palette(palette);
        colors
    }

    /// Override group colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.groups = [
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0xFF),
                ];
            }
            Palette::Colorblind => {
                // Avoid red/green alone
                self.groups = [
                    Color::Rgb(0x00, 0x77, 0xBB),
                    Color::Rgb(0xEE, 0x77, 0x33),
                    Color::Rgb(0x00, 0x99, 0x88),
                    Color::Rgb(0xCC, 0x33, 0x11),
                    Color::Rgb(0xEE, 0x33, 0x77),
                    Color::Rgb(0xBB, 0xBB, 0x00),
                ];
            }
        }
    }

    #[inline]
    pub fn group_color(&self, index: usize) -> Color {
        self.groups[index % self.groups.len()]
    }
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
pub(crate) fn sample_theme() -> Theme {
    let group = |name: &str, ids: &[&str]| LayerGroup {
        name: name.to_string(),
        variants: ids
            .iter()
            .map(|id| Variant {
                id: (*id).to_string(),
                svg: format!("<svg id=\"{id}\"/>"),
            })
            .collect(),
    };
    Theme {
        name: "sample".to_string(),
        app_background_color: "#101010".to_string(),
        font_color: "#FFF".to_string(),
        tile_background_color_primary: "#202020".to_string(),
        tile_background_color_secondary: "not a colour".to_string(),
        layer_groups: vec![
            group("frame", &["square", "circle"]),
            group("fill", &["red", "blue", "green"]),
        ],
    }
}
