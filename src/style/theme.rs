//! Theme, layout and brand value types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenerationError, Result};
use crate::style::palette::{is_hex_color, ColorPalette, FontFamily};

// == Font Style ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    pub name: String,
    pub size: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

// == Margins ==
/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 60.0,
            bottom: 60.0,
            left: 50.0,
            right: 50.0,
        }
    }
}

// == Layout Options ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub margins: Margins,
    pub header_height: f32,
    pub footer_height: f32,
    pub block_spacing: f32,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            header_height: 80.0,
            footer_height: 40.0,
            block_spacing: 20.0,
            line_spacing: 1.2,
            paragraph_spacing: 6.0,
        }
    }
}

// == Brand Identity ==
/// Brand fields carried by a theme or a template configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_logo: Option<bool>,
}

// == Brand Config ==
/// A brand override layer.
///
/// Merge depth is one level everywhere: `colors` and `fonts` merge per key
/// over the base (brand wins), every other field replaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<ColorPalette>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fonts: Option<FontFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_logo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_elements: Option<Value>,
}

impl BrandConfig {
    /// Brand colours must be hex and brand fonts must have a positive size,
    /// the same rules a template config follows.
    pub fn validate(&self) -> Result<()> {
        if let Some((role, value)) = self.colors.iter().flatten().find(|(_, v)| !is_hex_color(v)) {
            return Err(GenerationError::InvalidConfig(format!(
                "brand color '{role}' is not a hex color: {value}"
            )));
        }
        if let Some((role, _)) = self
            .fonts
            .iter()
            .flatten()
            .find(|(_, f)| !f.size.is_finite() || f.size <= 0.0)
        {
            return Err(GenerationError::InvalidConfig(format!(
                "brand font '{role}' must have a positive size"
            )));
        }
        Ok(())
    }

    pub fn merge_colors(&self, base: &ColorPalette) -> ColorPalette {
        let mut merged = base.clone();
        if let Some(colors) = &self.colors {
            merged.extend(colors.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    pub fn merge_fonts(&self, base: &FontFamily) -> FontFamily {
        let mut merged = base.clone();
        if let Some(fonts) = &self.fonts {
            merged.extend(fonts.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Layers the brand's logo and name fields over an existing identity.
    pub fn merge_identity(&self, base: Option<&BrandIdentity>) -> Option<BrandIdentity> {
        if self.logo.is_none() && self.brand_name.is_none() {
            return base.cloned();
        }

        let mut identity = base.cloned().unwrap_or_default();
        if let Some(logo) = &self.logo {
            identity.logo_path = Some(logo.clone());
            identity.logo_width = Some(self.logo_width.unwrap_or(70.0));
            identity.show_logo = Some(self.show_logo.unwrap_or(true));
        }
        if let Some(name) = &self.brand_name {
            identity.name = Some(name.clone());
            identity.tagline = self.tagline.clone();
        }
        Some(identity)
    }
}

// == Theme ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ColorPalette,
    pub fonts: FontFamily,
    #[serde(default)]
    pub layout: LayoutOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Kind-specific colour groups, e.g. macro colours for nutrition
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub accents: BTreeMap<String, ColorPalette>,
}
