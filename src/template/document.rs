//! Document Template Module
//!
//! The template-method lifecycle shared by every kind: header, content and
//! footer elements in that order, paginated by a rendering backend.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::style::Theme;
use crate::template::{
    DocumentElement, PageCallbacks, RenderBackend, StyleSheet, Surface, TemplateConfig,
};

/// Builds slower than this are logged.
pub const SLOW_BUILD_THRESHOLD: Duration = Duration::from_secs(3);
pub const DEFAULT_PREVIEW_PAGES: usize = 3;
const DEFAULT_WATERMARK: &str = "DRAFT";

// == Content Hooks ==
/// What a content builder sees while building.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub kind: &'a str,
    pub data: &'a Value,
    pub config: &'a TemplateConfig,
    pub styles: &'a StyleSheet,
    /// Page budget when in preview mode. Builders stop on their own.
    pub preview_pages: Option<usize>,
}

/// Hooks a document kind implements.
pub trait TemplateContent: Send + Sync {
    /// Configuration layer underneath variants and caller config.
    fn default_config(&self) -> TemplateConfig;

    fn build_content(&self, ctx: &BuildContext<'_>) -> Result<Vec<DocumentElement>>;

    /// Informational JSON schema for the data this kind expects.
    fn data_schema(&self) -> Value {
        default_data_schema()
    }
}

pub fn default_data_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"title": {"type": "string"}},
        "required": ["title"]
    })
}

// == Lifecycle ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateState {
    Constructed,
    Built,
    Done,
}

// == Document Template ==
pub struct DocumentTemplate {
    kind: String,
    content: Arc<dyn TemplateContent>,
    data: Value,
    config: TemplateConfig,
    theme: Option<Theme>,
    styles: StyleSheet,
    preview_pages: Option<usize>,
    page_count: usize,
    state: TemplateState,
}

impl std::fmt::Debug for DocumentTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTemplate")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("page_count", &self.page_count)
            .field("preview_pages", &self.preview_pages)
            .finish_non_exhaustive()
    }
}

impl DocumentTemplate {
    /// `config` is the fully merged configuration for this instance.
    pub fn new(kind: impl Into<String>, content: Arc<dyn TemplateContent>, data: Value, config: TemplateConfig) -> Self {
        let styles = StyleSheet::derive(&config, None);
        Self {
            kind: kind.into(),
            content,
            data,
            config,
            theme: None,
            styles,
            preview_pages: None,
            page_count: 0,
            state: TemplateState::Constructed,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn merged_config(&self) -> &TemplateConfig {
        &self.config
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn state(&self) -> TemplateState {
        self.state
    }

    pub fn preview_pages(&self) -> Option<usize> {
        self.preview_pages
    }

    /// Turns preview mode on with a page budget, or off.
    pub fn set_preview_mode(&mut self, enabled: bool, max_pages: usize) {
        self.preview_pages = enabled.then_some(max_pages.max(1));
    }

    /// Merges `overrides` over the current config and re-derives styles.
    /// A completed build is not affected.
    pub fn apply_style_overrides(&mut self, overrides: &TemplateConfig) {
        self.config = self.config.merge(overrides);
        self.styles = StyleSheet::derive(&self.config, self.theme.as_ref());
    }

    /// Uses `theme` as the fallback for colours and fonts the config leaves unset.
    pub fn use_theme(&mut self, theme: Theme) {
        self.styles = StyleSheet::derive(&self.config, Some(&theme));
        self.theme = Some(theme);
    }

    // == Build ==
    /// Assembles header, content and footer, renders them and writes the
    /// bytes to `sink`. Returns the page count. Building again overwrites
    /// the previous result.
    pub fn build(&mut self, backend: &dyn RenderBackend, sink: &mut dyn Write) -> Result<usize> {
        let started = Instant::now();

        let mut elements = self.header_elements();
        let ctx = BuildContext {
            kind: &self.kind,
            data: &self.data,
            config: &self.config,
            styles: &self.styles,
            preview_pages: self.preview_pages,
        };
        elements.extend(self.content.build_content(&ctx)?);
        elements.extend(self.footer_elements());
        self.state = TemplateState::Built;

        let page_size = self.config.page_size.unwrap_or_default();
        let margins = self.config.margins();
        let mut decorator = PageDecorator { config: &self.config };
        let output = backend.render(&elements, page_size, &margins, &mut decorator)?;

        sink.write_all(&output.bytes)?;
        sink.flush()?;
        self.page_count = output.page_count;
        self.state = TemplateState::Done;

        let elapsed = started.elapsed();
        if elapsed > SLOW_BUILD_THRESHOLD {
            warn!(kind = %self.kind, elapsed_ms = elapsed.as_millis() as u64, "Slow document build");
        } else {
            debug!(kind = %self.kind, pages = self.page_count, elapsed_ms = elapsed.as_millis() as u64, "Document built");
        }
        Ok(self.page_count)
    }

    fn header_elements(&self) -> Vec<DocumentElement> {
        if !self.config.show_header.unwrap_or(true) {
            return Vec::new();
        }

        let title = self
            .data
            .get("title")
            .and_then(Value::as_str)
            .map_or_else(|| humanize(&self.kind), str::to_string);
        let mut elements = vec![DocumentElement::text(title, &self.styles.title)];

        if let Some(client) = self.data.get("client_name").and_then(Value::as_str) {
            elements.push(DocumentElement::text(format!("Client: {client}"), &self.styles.body));
        }
        if let Some(name) = self.config.brand.as_ref().and_then(|b| b.name.as_deref()) {
            elements.push(DocumentElement::text(name, &self.styles.caption));
        }
        elements.push(DocumentElement::spacer(self.block_spacing()));
        elements
    }

    fn footer_elements(&self) -> Vec<DocumentElement> {
        if !self.config.show_footer.unwrap_or(true) {
            return Vec::new();
        }

        let note = self
            .data
            .get("footer")
            .and_then(Value::as_str)
            .or_else(|| self.config.brand.as_ref().and_then(|b| b.tagline.as_deref()));
        match note {
            Some(note) => vec![
                DocumentElement::spacer(self.block_spacing()),
                DocumentElement::text(note, &self.styles.caption),
            ],
            None => Vec::new(),
        }
    }

    fn block_spacing(&self) -> f32 {
        self.config.layout.as_ref().map_or(20.0, |l| l.block_spacing)
    }
}

// == Page Decoration ==
/// Watermark on the first page, page numbers on later pages.
struct PageDecorator<'a> {
    config: &'a TemplateConfig,
}

impl PageCallbacks for PageDecorator<'_> {
    fn on_first_page(&mut self, surface: &mut dyn Surface) {
        if let Some(watermark) = self.config.watermark.as_ref().filter(|w| w.enabled) {
            let text = watermark.text.as_deref().unwrap_or(DEFAULT_WATERMARK);
            let (x, y) = (surface.width() / 2.0, surface.height() / 2.0);
            surface.draw_text(x, y, text);
        }
        if let Some(brand) = &self.config.brand {
            if let (Some(logo), true) = (&brand.logo_path, brand.show_logo.unwrap_or(true)) {
                let y = surface.height() - 40.0;
                surface.draw_text(40.0, y, &format!("[logo {logo}]"));
            }
        }
    }

    fn on_later_pages(&mut self, surface: &mut dyn Surface) {
        if self.config.show_page_numbers.unwrap_or(true) {
            let label = format!("Page {}", surface.page_number());
            let x = surface.width() - 50.0;
            surface.draw_text(x, 30.0, &label);
        }
    }
}

/// `meal_plan` -> `Meal Plan`
pub fn humanize(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
