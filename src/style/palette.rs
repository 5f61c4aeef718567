//! Built-in palettes, font families and layout defaults.

use std::collections::BTreeMap;

use crate::style::{FontStyle, LayoutOptions};

pub type ColorPalette = BTreeMap<String, String>;
pub type FontFamily = BTreeMap<String, FontStyle>;

pub const DEFAULT_PALETTE: &str = "professional";
pub const DEFAULT_FONT_FAMILY: &str = "modern";

const PALETTES: &[(&str, [(&str, &str); 11])] = &[
    (
        "professional",
        [
            ("primary", "#2563EB"),
            ("secondary", "#7C3AED"),
            ("accent", "#059669"),
            ("background", "#FFFFFF"),
            ("surface", "#F8FAFC"),
            ("text_primary", "#1F2937"),
            ("text_secondary", "#6B7280"),
            ("border", "#E5E7EB"),
            ("success", "#10B981"),
            ("warning", "#F59E0B"),
            ("error", "#EF4444"),
        ],
    ),
    (
        "vibrant",
        [
            ("primary", "#FF6B35"),
            ("secondary", "#F7931E"),
            ("accent", "#2E86AB"),
            ("background", "#FFFFFF"),
            ("surface", "#FFF8F5"),
            ("text_primary", "#2C3E50"),
            ("text_secondary", "#7F8C8D"),
            ("border", "#E8E8E8"),
            ("success", "#27AE60"),
            ("warning", "#F39C12"),
            ("error", "#E74C3C"),
        ],
    ),
    (
        "monochrome",
        [
            ("primary", "#000000"),
            ("secondary", "#4A4A4A"),
            ("accent", "#808080"),
            ("background", "#FFFFFF"),
            ("surface", "#F5F5F5"),
            ("text_primary", "#000000"),
            ("text_secondary", "#666666"),
            ("border", "#CCCCCC"),
            ("success", "#666666"),
            ("warning", "#666666"),
            ("error", "#000000"),
        ],
    ),
    (
        "fitness",
        [
            ("primary", "#FF4500"),
            ("secondary", "#FF6347"),
            ("accent", "#32CD32"),
            ("background", "#FFFFFF"),
            ("surface", "#FFF5EE"),
            ("text_primary", "#2F4F4F"),
            ("text_secondary", "#708090"),
            ("border", "#DCDCDC"),
            ("success", "#228B22"),
            ("warning", "#FF8C00"),
            ("error", "#DC143C"),
        ],
    ),
];

// (role, font name, size, weight) per family
const FONT_FAMILIES: &[(&str, [(&str, &str, f32, &str); 7])] = &[
    (
        "modern",
        [
            ("title", "Helvetica-Bold", 24.0, "bold"),
            ("subtitle", "Helvetica-Bold", 18.0, "bold"),
            ("heading", "Helvetica-Bold", 14.0, "bold"),
            ("subheading", "Helvetica", 12.0, "normal"),
            ("body", "Helvetica", 10.0, "normal"),
            ("caption", "Helvetica", 8.0, "normal"),
            ("code", "Courier", 9.0, "normal"),
        ],
    ),
    (
        "classic",
        [
            ("title", "Times-Bold", 22.0, "bold"),
            ("subtitle", "Times-Bold", 16.0, "bold"),
            ("heading", "Times-Bold", 13.0, "bold"),
            ("subheading", "Times-Roman", 11.0, "normal"),
            ("body", "Times-Roman", 10.0, "normal"),
            ("caption", "Times-Italic", 8.0, "normal"),
            ("code", "Courier", 9.0, "normal"),
        ],
    ),
    (
        "sans",
        [
            ("title", "Helvetica-Bold", 26.0, "bold"),
            ("subtitle", "Helvetica-Bold", 20.0, "bold"),
            ("heading", "Helvetica-Bold", 15.0, "bold"),
            ("subheading", "Helvetica", 13.0, "normal"),
            ("body", "Helvetica", 11.0, "normal"),
            ("caption", "Helvetica", 9.0, "normal"),
            ("code", "Courier", 9.0, "normal"),
        ],
    ),
];

/// Returns a built-in palette, falling back to `professional`.
pub fn color_palette(name: &str) -> ColorPalette {
    let colors = PALETTES
        .iter()
        .find(|(palette, _)| *palette == name)
        .or_else(|| PALETTES.iter().find(|(palette, _)| *palette == DEFAULT_PALETTE))
        .map(|(_, colors)| colors.as_slice())
        .unwrap_or_default();

    colors
        .iter()
        .map(|(role, hex)| (role.to_string(), hex.to_string()))
        .collect()
}

/// Returns a built-in font family, falling back to `modern`.
pub fn font_family(name: &str) -> FontFamily {
    let fonts = FONT_FAMILIES
        .iter()
        .find(|(family, _)| *family == name)
        .or_else(|| FONT_FAMILIES.iter().find(|(family, _)| *family == DEFAULT_FONT_FAMILY))
        .map(|(_, fonts)| fonts.as_slice())
        .unwrap_or_default();

    fonts
        .iter()
        .map(|(role, font, size, weight)| {
            (
                role.to_string(),
                FontStyle {
                    name: font.to_string(),
                    size: *size,
                    weight: Some(weight.to_string()),
                },
            )
        })
        .collect()
}

pub fn palette_names() -> impl Iterator<Item = &'static str> {
    PALETTES.iter().map(|(name, _)| *name)
}

pub fn font_family_names() -> impl Iterator<Item = &'static str> {
    FONT_FAMILIES.iter().map(|(name, _)| *name)
}

pub fn default_layout() -> LayoutOptions {
    LayoutOptions::default()
}

/// `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_palette() {
        let palette = color_palette("vibrant");
        assert_eq!(palette["primary"], "#FF6B35");
        assert_eq!(palette.len(), 11);
    }

    #[test]
    fn test_unknown_palette_falls_back() {
        assert_eq!(color_palette("neon"), color_palette("professional"));
    }

    #[test]
    fn test_font_family_fallback() {
        let fonts = font_family("gothic");
        assert_eq!(fonts["title"].name, "Helvetica-Bold");
        assert_eq!(fonts["title"].size, 24.0);
        assert_eq!(font_family("classic")["body"].name, "Times-Roman");
    }

    #[test]
    fn test_hex_colors() {
        assert!(is_hex_color("#FFF"));
        assert!(is_hex_color("#1f2937"));
        assert!(!is_hex_color("1F2937"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn test_all_builtins_are_valid_hex() {
        for name in palette_names() {
            assert!(color_palette(name).values().all(|hex| is_hex_color(hex)), "{name}");
        }
    }
}
