//! Template Configuration Module
//!
//! Typed, layered template configuration. Every concern is an optional
//! field; layering is a shallow, rightmost-wins merge per top-level field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenerationError, Result};
use crate::style::palette::{self, is_hex_color};
use crate::style::{BrandConfig, BrandIdentity, ColorPalette, FontFamily, LayoutOptions, Margins};

/// Field names of [`TemplateConfig`]; kind-specific options may not reuse them.
pub const RESERVED_KEYS: [&str; 14] = [
    "variant",
    "theme",
    "page_size",
    "show_header",
    "show_footer",
    "show_page_numbers",
    "colors",
    "fonts",
    "layout",
    "watermark",
    "logo",
    "custom_elements",
    "brand",
    "max_preview_pages",
];

// == Page Size ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

// == Color / Font Specs ==
/// Either a built-in palette name or explicit colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Named(String),
    Custom(ColorPalette),
}

impl ColorSpec {
    pub fn resolve(&self) -> ColorPalette {
        match self {
            ColorSpec::Named(name) => palette::color_palette(name),
            ColorSpec::Custom(colors) => colors.clone(),
        }
    }
}

/// Either a built-in font family name or explicit fonts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSpec {
    Named(String),
    Custom(FontFamily),
}

impl FontSpec {
    pub fn resolve(&self) -> FontFamily {
        match self {
            FontSpec::Named(name) => palette::font_family(name),
            FontSpec::Custom(fonts) => fonts.clone(),
        }
    }
}

// == Watermark ==
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// == Template Config ==
/// One configuration layer.
///
/// Unknown keys land in `options` (kind-specific flags such as
/// `show_macros`). An empty config serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Named variant; reserved key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Named theme from the style resolver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_header: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_footer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_page_numbers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<ColorSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fonts: Option<FontSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_elements: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_preview_pages: Option<usize>,
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl TemplateConfig {
    pub fn builder() -> TemplateConfigBuilder {
        TemplateConfigBuilder::default()
    }

    // == Merge ==
    /// Layers `over` on top of `self`. Fields set in `over` win; `options`
    /// merge per key.
    pub fn merge(&self, over: &TemplateConfig) -> TemplateConfig {
        let mut options = self.options.clone();
        options.extend(over.options.iter().map(|(k, v)| (k.clone(), v.clone())));

        TemplateConfig {
            variant: over.variant.clone().or_else(|| self.variant.clone()),
            theme: over.theme.clone().or_else(|| self.theme.clone()),
            page_size: over.page_size.or(self.page_size),
            show_header: over.show_header.or(self.show_header),
            show_footer: over.show_footer.or(self.show_footer),
            show_page_numbers: over.show_page_numbers.or(self.show_page_numbers),
            colors: over.colors.clone().or_else(|| self.colors.clone()),
            fonts: over.fonts.clone().or_else(|| self.fonts.clone()),
            layout: over.layout.clone().or_else(|| self.layout.clone()),
            watermark: over.watermark.clone().or_else(|| self.watermark.clone()),
            logo: over.logo.clone().or_else(|| self.logo.clone()),
            custom_elements: over.custom_elements.clone().or_else(|| self.custom_elements.clone()),
            brand: over.brand.clone().or_else(|| self.brand.clone()),
            max_preview_pages: over.max_preview_pages.or(self.max_preview_pages),
            options,
        }
    }

    /// Applies a brand layer: colours and fonts merge one level deep over
    /// their resolved base, logo and custom elements replace.
    pub fn with_brand(&self, brand: &BrandConfig) -> TemplateConfig {
        let mut branded = self.clone();

        if brand.colors.is_some() {
            let base = self.colors.as_ref().map(ColorSpec::resolve).unwrap_or_default();
            branded.colors = Some(ColorSpec::Custom(brand.merge_colors(&base)));
        }
        if brand.fonts.is_some() {
            let base = self.fonts.as_ref().map(FontSpec::resolve).unwrap_or_default();
            branded.fonts = Some(FontSpec::Custom(brand.merge_fonts(&base)));
        }
        if let Some(logo) = &brand.logo {
            branded.logo = Some(logo.clone());
        }
        if let Some(elements) = &brand.custom_elements {
            branded.custom_elements = Some(elements.clone());
        }
        branded.brand = brand.merge_identity(self.brand.as_ref());
        branded
    }

    /// Kind-specific flag lookup, `default` when unset or not a bool.
    pub fn flag(&self, name: &str, default: bool) -> bool {
        self.options.get(name).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn margins(&self) -> Margins {
        self.layout.as_ref().map(|l| l.margins).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        *self == TemplateConfig::default()
    }

    // == Validate ==
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(GenerationError::InvalidConfig(reason));

        if self.variant.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return invalid("variant must not be empty".to_string());
        }
        if let Some(ColorSpec::Custom(colors)) = &self.colors {
            if let Some((role, value)) = colors.iter().find(|(_, v)| !is_hex_color(v)) {
                return invalid(format!("color '{role}' is not a hex color: {value}"));
            }
        }
        if let Some(FontSpec::Custom(fonts)) = &self.fonts {
            if let Some((role, _)) = fonts.iter().find(|(_, f)| !f.size.is_finite() || f.size <= 0.0) {
                return invalid(format!("font '{role}' must have a positive size"));
            }
        }
        if let Some(layout) = &self.layout {
            let m = layout.margins;
            if [m.top, m.bottom, m.left, m.right].iter().any(|v| !v.is_finite() || *v < 0.0) {
                return invalid("margins must be finite and not negative".to_string());
            }
        }
        if self.max_preview_pages == Some(0) {
            return invalid("max_preview_pages must be at least 1".to_string());
        }
        if let Some(key) = self.options.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
            return invalid(format!("option '{key}' shadows a reserved field"));
        }
        Ok(())
    }
}

// == Builder ==
#[derive(Debug, Default)]
pub struct TemplateConfigBuilder {
    config: TemplateConfig,
}

impl TemplateConfigBuilder {
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.config.variant = Some(name.into());
        self
    }

    pub fn theme(mut self, name: impl Into<String>) -> Self {
        self.config.theme = Some(name.into());
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = Some(size);
        self
    }

    pub fn show_header(mut self, show: bool) -> Self {
        self.config.show_header = Some(show);
        self
    }

    pub fn show_footer(mut self, show: bool) -> Self {
        self.config.show_footer = Some(show);
        self
    }

    pub fn show_page_numbers(mut self, show: bool) -> Self {
        self.config.show_page_numbers = Some(show);
        self
    }

    pub fn palette(mut self, name: impl Into<String>) -> Self {
        self.config.colors = Some(ColorSpec::Named(name.into()));
        self
    }

    pub fn colors(mut self, colors: ColorPalette) -> Self {
        self.config.colors = Some(ColorSpec::Custom(colors));
        self
    }

    pub fn font_family(mut self, name: impl Into<String>) -> Self {
        self.config.fonts = Some(FontSpec::Named(name.into()));
        self
    }

    pub fn fonts(mut self, fonts: FontFamily) -> Self {
        self.config.fonts = Some(FontSpec::Custom(fonts));
        self
    }

    pub fn layout(mut self, layout: LayoutOptions) -> Self {
        self.config.layout = Some(layout);
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        let mut layout = self.config.layout.take().unwrap_or_default();
        layout.margins = margins;
        self.config.layout = Some(layout);
        self
    }

    pub fn watermark(mut self, text: impl Into<String>) -> Self {
        self.config.watermark = Some(Watermark {
            enabled: true,
            text: Some(text.into()),
        });
        self
    }

    pub fn logo(mut self, path: impl Into<String>) -> Self {
        self.config.logo = Some(path.into());
        self
    }

    pub fn custom_elements(mut self, elements: Value) -> Self {
        self.config.custom_elements = Some(elements);
        self
    }

    pub fn brand(mut self, brand: BrandIdentity) -> Self {
        self.config.brand = Some(brand);
        self
    }

    pub fn max_preview_pages(mut self, pages: usize) -> Self {
        self.config.max_preview_pages = Some(pages);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.options.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<TemplateConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
