//! Bundled content builders.
//!
//! One generic sectioned builder serves every bundled kind: each top-level
//! data field becomes a section, rendered as text, a list or a table.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::{GenerationError, Result};
use crate::registry::TemplateRegistry;
use crate::template::document::humanize;
use crate::template::{BuildContext, ColorSpec, DocumentElement, TemplateConfig, TemplateContent};

/// Sections a preview assumes fit on one page.
const SECTIONS_PER_PAGE: usize = 4;

/// Fields rendered by the header and footer instead of as sections.
const FRAME_FIELDS: [&str; 3] = ["title", "client_name", "footer"];

// == Sectioned Template ==
#[derive(Debug, Clone)]
pub struct SectionedTemplate {
    /// (field, JSON type) pairs the data schema requires
    required: Vec<(&'static str, &'static str)>,
    defaults: TemplateConfig,
}

impl SectionedTemplate {
    pub fn new(required: &[(&'static str, &'static str)], defaults: TemplateConfig) -> Self {
        let mut fields = vec![("title", "string")];
        fields.extend(required.iter().copied().filter(|(field, _)| *field != "title"));
        Self {
            required: fields,
            defaults,
        }
    }

    fn section(&self, ctx: &BuildContext<'_>, key: &str, value: &Value) -> Vec<DocumentElement> {
        let mut elements = vec![DocumentElement::text(humanize(key), &ctx.styles.heading)];

        match value {
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                elements.push(object_table(items));
            }
            Value::Array(items) => {
                for item in items {
                    elements.push(DocumentElement::text(format!("- {}", scalar_text(item)), &ctx.styles.body));
                }
            }
            Value::Object(fields) => {
                let rows = fields.iter().map(|(k, v)| vec![humanize(k), scalar_text(v)]).collect();
                elements.push(DocumentElement::Table { rows, header_rows: 0 });
            }
            other => elements.push(DocumentElement::text(scalar_text(other), &ctx.styles.body)),
        }

        elements.push(DocumentElement::spacer(ctx.config.layout.as_ref().map_or(20.0, |l| l.block_spacing)));
        elements
    }
}

impl TemplateContent for SectionedTemplate {
    fn default_config(&self) -> TemplateConfig {
        self.defaults.clone()
    }

    fn build_content(&self, ctx: &BuildContext<'_>) -> Result<Vec<DocumentElement>> {
        let fields = ctx.data.as_object().ok_or_else(|| {
            GenerationError::Build(format!("{} data must be an object", ctx.kind))
        })?;

        let budget = ctx.preview_pages.map(|pages| pages * SECTIONS_PER_PAGE);
        let sections = fields
            .iter()
            .filter(|(key, value)| !FRAME_FIELDS.contains(&key.as_str()) && !value.is_null())
            .filter(|(key, _)| ctx.config.flag(&format!("show_{key}"), true))
            .take(budget.unwrap_or(usize::MAX));

        Ok(sections.flat_map(|(key, value)| self.section(ctx, key, value)).collect())
    }

    fn data_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .required
            .iter()
            .map(|(field, kind)| (field.to_string(), json!({"type": kind})))
            .collect();
        let required: Vec<&str> = self.required.iter().map(|(field, _)| *field).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn object_table(items: &[Value]) -> DocumentElement {
    let columns: BTreeSet<&String> = items.iter().filter_map(Value::as_object).flat_map(|fields| fields.keys()).collect();

    let mut rows = vec![columns.iter().map(|c| humanize(c)).collect::<Vec<_>>()];
    for item in items {
        rows.push(
            columns
                .iter()
                .map(|c| item.get(c.as_str()).map(scalar_text).unwrap_or_default())
                .collect(),
        );
    }
    DocumentElement::Table { rows, header_rows: 1 }
}

// == Standard Registry ==
fn variant(entries: &[(&str, Value)]) -> TemplateConfig {
    TemplateConfig {
        options: entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ..TemplateConfig::default()
    }
}

fn palette_variant(style: &str, palette: &str) -> TemplateConfig {
    TemplateConfig {
        colors: Some(ColorSpec::Named(palette.to_string())),
        ..variant(&[("style", json!(style))])
    }
}

fn required_for(kind: &str) -> Vec<(&'static str, &'static str)> {
    let mut required = vec![("title", "string")];
    if kind.starts_with("workout_") {
        required.extend([("client_name", "string"), ("exercises", "array")]);
    }
    if kind.starts_with("nutrition_") {
        required.extend([("client_name", "string"), ("nutrition_data", "object")]);
    }
    if kind.starts_with("session_") {
        required.push(("blocks", "array"));
    }
    required
}

/// Registry with the standard kinds and their variants.
pub fn standard_registry() -> Result<TemplateRegistry> {
    let mut registry = TemplateRegistry::new();

    let kinds: [(&str, Vec<(&str, TemplateConfig)>); 5] = [
        (
            "session",
            vec![
                ("modern", palette_variant("modern", "vibrant")),
                ("classic", palette_variant("classic", "professional")),
                ("minimal", palette_variant("minimal", "monochrome")),
            ],
        ),
        (
            "nutrition",
            vec![
                ("detailed", variant(&[("show_macros", json!(true)), ("show_timeline", json!(true))])),
                ("summary", variant(&[("show_macros", json!(true)), ("show_timeline", json!(false))])),
                ("simple", variant(&[("show_macros", json!(false)), ("show_timeline", json!(false))])),
            ],
        ),
        (
            "program",
            vec![
                ("weekly", variant(&[("schedule_layout", json!("weekly")), ("show_progression", json!(true))])),
                ("daily", variant(&[("schedule_layout", json!("daily")), ("show_progression", json!(false))])),
                ("compact", variant(&[("schedule_layout", json!("compact")), ("show_progression", json!(true))])),
            ],
        ),
        (
            "meal_plan",
            vec![
                ("detailed", variant(&[("show_recipes", json!(true)), ("show_shopping_list", json!(true))])),
                ("overview", variant(&[("show_recipes", json!(false)), ("show_shopping_list", json!(true))])),
                ("simple", variant(&[("show_recipes", json!(false)), ("show_shopping_list", json!(false))])),
            ],
        ),
        (
            "progress_report",
            vec![
                (
                    "comprehensive",
                    variant(&[("show_charts", json!(true)), ("show_photos", json!(true)), ("show_measurements", json!(true))]),
                ),
                (
                    "visual",
                    variant(&[("show_charts", json!(true)), ("show_photos", json!(true)), ("show_measurements", json!(false))]),
                ),
                (
                    "data",
                    variant(&[("show_charts", json!(true)), ("show_photos", json!(false)), ("show_measurements", json!(true))]),
                ),
            ],
        ),
    ];

    for (kind, variants) in kinds {
        registry.register(kind, Arc::new(SectionedTemplate::new(&required_for(kind), TemplateConfig::default())))?;
        for (name, config) in variants {
            registry.register_variant(kind, name, config)?;
        }
    }
    Ok(registry)
}

/// Professional kinds layered over `parent`; unknown kinds fall back to it.
pub fn professional_registry(parent: Arc<TemplateRegistry>) -> Result<TemplateRegistry> {
    let mut registry = TemplateRegistry::with_parent(parent);

    let kinds = [
        ("session_premium", "professional", "classic"),
        ("workout_elite", "monochrome", "modern"),
        ("nutrition_science", "professional", "sans"),
    ];
    for (kind, palette, family) in kinds {
        let defaults = TemplateConfig::builder().palette(palette).font_family(family).build()?;
        registry.register(kind, Arc::new(SectionedTemplate::new(&required_for(kind), defaults)))?;
    }
    Ok(registry)
}
