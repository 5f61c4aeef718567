//! Document elements and the text styles derived from a configuration.

use serde::Serialize;

use crate::style::{FontFamily, Theme};
use crate::template::TemplateConfig;

// == Text Style ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    /// Role name: title, heading, body or caption
    pub role: &'static str,
    pub font: String,
    pub size: f32,
    pub color: String,
}

// == Style Sheet ==
/// Text styles for one template, derived from its merged configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleSheet {
    pub title: TextStyle,
    pub heading: TextStyle,
    pub body: TextStyle,
    pub caption: TextStyle,
}

impl StyleSheet {
    /// Derives styles from `config`, using `theme` for anything the config
    /// leaves unset and fixed defaults after that.
    pub fn derive(config: &TemplateConfig, theme: Option<&Theme>) -> Self {
        let colors = config
            .colors
            .as_ref()
            .map(|spec| spec.resolve())
            .or_else(|| theme.map(|t| t.colors.clone()))
            .unwrap_or_default();
        let fonts = config
            .fonts
            .as_ref()
            .map(|spec| spec.resolve())
            .or_else(|| theme.map(|t| t.fonts.clone()))
            .unwrap_or_default();

        let primary = colors.get("text_primary").cloned().unwrap_or_else(|| "#000000".to_string());
        let secondary = colors.get("text_secondary").cloned().unwrap_or_else(|| "#666666".to_string());

        Self {
            title: text_style(&fonts, "title", "Helvetica-Bold", 20.0, &primary),
            heading: text_style(&fonts, "heading", "Helvetica-Bold", 14.0, &primary),
            body: text_style(&fonts, "body", "Helvetica", 10.0, &primary),
            caption: text_style(&fonts, "caption", "Helvetica", 8.0, &secondary),
        }
    }
}

fn text_style(fonts: &FontFamily, role: &'static str, font: &str, size: f32, color: &str) -> TextStyle {
    let configured = fonts.get(role);
    TextStyle {
        role,
        font: configured.map_or_else(|| font.to_string(), |f| f.name.clone()),
        size: configured.map_or(size, |f| f.size),
        color: color.to_string(),
    }
}

// == Document Element ==
/// A renderable unit handed to the rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentElement {
    Text { content: String, style: TextStyle },
    Table { rows: Vec<Vec<String>>, header_rows: usize },
    Spacer { height: f32 },
    PageBreak,
}

impl DocumentElement {
    pub fn text(content: impl Into<String>, style: &TextStyle) -> Self {
        DocumentElement::Text {
            content: content.into(),
            style: style.clone(),
        }
    }

    pub fn spacer(height: f32) -> Self {
        DocumentElement::Spacer { height }
    }
}
