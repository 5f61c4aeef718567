//! Style Resolver Module
//!
//! Named themes with fallback, brand customization and theme persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::style::palette::{self, is_hex_color, ColorPalette, FontFamily};
use crate::style::{BrandConfig, LayoutOptions, Theme};

pub const DEFAULT_THEME: &str = "default";
const BRAND_SETTINGS_FILE: &str = "brand_settings.json";

const REQUIRED_COLORS: [&str; 3] = ["primary", "background", "text_primary"];
const REQUIRED_FONTS: [&str; 2] = ["title", "body"];

// == Style Resolver ==
/// Registry of named themes.
///
/// Lookups never fail: unknown names resolve to the built-in defaults.
/// Mutation assumes a single writer; callers share it behind a lock.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    /// Theme file, None for an in-memory resolver
    themes_path: Option<PathBuf>,
    themes: BTreeMap<String, Theme>,
    brand_settings: Option<BrandConfig>,
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StyleResolver {
    // == Constructors ==
    /// A resolver with the built-in themes and no persistence.
    pub fn in_memory() -> Self {
        Self {
            themes_path: None,
            themes: default_themes(),
            brand_settings: None,
        }
    }

    /// Loads themes from `themes_path` and brand settings from the
    /// `brand_settings.json` next to it. Missing or unreadable files fall
    /// back to the built-ins.
    pub fn load(themes_path: impl Into<PathBuf>) -> Self {
        let themes_path = themes_path.into();

        let mut themes = read_json::<BTreeMap<String, Theme>>(&themes_path).unwrap_or_else(default_themes);
        if !themes.contains_key(DEFAULT_THEME) {
            themes.insert(DEFAULT_THEME.to_string(), builtin_default_theme());
        }

        let brand_settings = themes_path
            .parent()
            .map(|dir| dir.join(BRAND_SETTINGS_FILE))
            .and_then(|path| read_json::<BrandConfig>(&path))
            .filter(|brand| match brand.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "Ignoring invalid brand settings");
                    false
                }
            });

        info!(
            path = %themes_path.display(),
            themes = themes.len(),
            brand = brand_settings.is_some(),
            "Themes loaded"
        );

        Self {
            themes_path: Some(themes_path),
            themes,
            brand_settings,
        }
    }

    // == Lookups ==
    /// Returns the named theme or the `default` theme.
    pub fn theme(&self, name: &str) -> &Theme {
        self.themes
            .get(name)
            .or_else(|| self.themes.get(DEFAULT_THEME))
            .unwrap_or_else(|| default_theme_ref())
    }

    pub fn has_theme(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    pub fn theme_names(&self) -> Vec<String> {
        self.themes.keys().cloned().collect()
    }

    pub fn color_palette(&self, name: &str) -> ColorPalette {
        palette::color_palette(name)
    }

    pub fn font_family(&self, name: &str) -> FontFamily {
        palette::font_family(name)
    }

    /// Studio-wide brand settings, if a brand settings file was found.
    pub fn brand_settings(&self) -> Option<&BrandConfig> {
        self.brand_settings.as_ref()
    }

    // == Create Custom Theme ==
    /// Composes a theme from a palette and a font family, registers it and
    /// rewrites the theme file.
    pub fn create_custom_theme(
        &mut self,
        name: &str,
        palette: &str,
        font_family: &str,
        layout: Option<LayoutOptions>,
    ) -> Result<Theme> {
        let theme = Theme {
            name: name.to_string(),
            colors: palette::color_palette(palette),
            fonts: palette::font_family(font_family),
            layout: layout.unwrap_or_else(palette::default_layout),
            brand: None,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            accents: BTreeMap::new(),
        };

        self.themes.insert(name.to_string(), theme.clone());
        self.save_themes()?;
        debug!(theme = name, palette, font_family, "Custom theme created");
        Ok(theme)
    }

    // == Brand Customization ==
    /// Returns a copy of `theme` with the brand layered over it.
    pub fn apply_brand_customization(&self, theme: &Theme, brand: &BrandConfig) -> Theme {
        Theme {
            colors: brand.merge_colors(&theme.colors),
            fonts: brand.merge_fonts(&theme.fonts),
            brand: brand.merge_identity(theme.brand.as_ref()),
            ..theme.clone()
        }
    }

    // == Template Styles ==
    /// Theme plus the colour accents a given kind uses.
    pub fn template_styles(&self, kind: &str, theme_name: &str) -> Theme {
        let mut theme = self.theme(theme_name).clone();
        let color = |role: &str| theme.colors.get(role).cloned().unwrap_or_default();

        let accents: Option<(&str, Vec<(&str, String)>)> = match kind {
            "session" => Some((
                "table",
                vec![
                    ("header_bg", color("primary")),
                    ("row_odd_bg", color("surface")),
                    ("row_even_bg", color("background")),
                    ("border_color", color("border")),
                ],
            )),
            "nutrition" => Some((
                "macros",
                vec![
                    ("protein", "#3C91E6".to_string()),
                    ("carbs", "#FFAD05".to_string()),
                    ("fat", "#E4572E".to_string()),
                ],
            )),
            "program" => Some((
                "progression",
                vec![
                    ("increase", color("success")),
                    ("maintain", color("accent")),
                    ("decrease", color("warning")),
                ],
            )),
            "meal_plan" => Some((
                "meals",
                vec![
                    ("breakfast", "#FF6B35".to_string()),
                    ("lunch", "#2E86AB".to_string()),
                    ("dinner", "#7C3AED".to_string()),
                    ("snack", "#10B981".to_string()),
                ],
            )),
            "progress_report" => Some((
                "progress",
                vec![
                    ("improvement", color("success")),
                    ("regression", color("error")),
                    ("stable", color("accent")),
                ],
            )),
            _ => None,
        };

        if let Some((group, colors)) = accents {
            let palette = colors.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
            theme.accents.insert(group.to_string(), palette);
        }
        theme
    }

    // == Validate ==
    /// Lists problems with a theme. Advisory only: resolution never checks.
    pub fn validate_theme(theme: &Theme) -> Vec<String> {
        let mut violations = Vec::new();

        for color in REQUIRED_COLORS {
            if !theme.colors.contains_key(color) {
                violations.push(format!("Missing required color: {color}"));
            }
        }
        for (role, value) in &theme.colors {
            if !is_hex_color(value) {
                violations.push(format!("Invalid color for {role}: {value}"));
            }
        }
        for font in REQUIRED_FONTS {
            if !theme.fonts.contains_key(font) {
                violations.push(format!("Missing required font: {font}"));
            }
        }
        for (role, font) in &theme.fonts {
            if font.size <= 0.0 {
                violations.push(format!("Font size for {role} must be positive"));
            }
        }
        let m = theme.layout.margins;
        if [m.top, m.bottom, m.left, m.right].iter().any(|v| *v < 0.0) {
            violations.push("Margins must not be negative".to_string());
        }

        violations
    }

    fn save_themes(&self) -> Result<()> {
        let Some(path) = &self.themes_path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&self.themes)?)?;
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read(path).ok()?;
    match serde_json::from_slice(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable style file");
            None
        }
    }
}

fn theme_from(name: &str, palette_name: &str, family: &str) -> Theme {
    Theme {
        name: name.to_string(),
        colors: palette::color_palette(palette_name),
        fonts: palette::font_family(family),
        layout: palette::default_layout(),
        brand: None,
        created_at: None,
        accents: BTreeMap::new(),
    }
}

fn builtin_default_theme() -> Theme {
    theme_from("Default", "professional", "modern")
}

fn default_theme_ref() -> &'static Theme {
    static DEFAULT: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();
    DEFAULT.get_or_init(builtin_default_theme)
}

fn default_themes() -> BTreeMap<String, Theme> {
    BTreeMap::from([
        (DEFAULT_THEME.to_string(), builtin_default_theme()),
        ("fitness".to_string(), theme_from("Fitness", "fitness", "sans")),
        ("minimal".to_string(), theme_from("Minimal", "monochrome", "classic")),
    ])
}
