//! Template Registry Module
//!
//! Maps kinds to content builders, stores named variants and resolves the
//! configuration layers for each new template.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::registry::{UsageAnalytics, UsageTracker};
use crate::style::BrandConfig;
use crate::template::{DocumentTemplate, TemplateConfig, TemplateContent};

/// Reported for kinds without named variants.
pub const DEFAULT_VARIANT: &str = "default";

// == Template Registry ==
/// Kind -> content builder map with optional fallback to a parent registry.
///
/// A registry created with [`TemplateRegistry::with_parent`] shares the
/// parent's usage counters, so analytics cover the whole chain.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<dyn TemplateContent>>,
    variants: HashMap<String, BTreeMap<String, TemplateConfig>>,
    parent: Option<Arc<TemplateRegistry>>,
    usage: UsageTracker,
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&String> = self.templates.keys().collect();
        kinds.sort();
        f.debug_struct("TemplateRegistry")
            .field("kinds", &kinds)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Arc<TemplateRegistry>) -> Self {
        Self {
            usage: parent.usage.clone(),
            parent: Some(parent),
            ..Self::default()
        }
    }

    // == Registration ==
    /// Registers a content builder. The last registration for a kind wins.
    pub fn register(&mut self, kind: &str, content: Arc<dyn TemplateContent>) -> Result<()> {
        if !is_valid_kind(kind) {
            return Err(GenerationError::InvalidTemplate(format!("invalid kind name '{kind}'")));
        }
        content
            .default_config()
            .validate()
            .map_err(|err| GenerationError::InvalidTemplate(format!("{kind}: {err}")))?;

        if self.templates.insert(kind.to_string(), content).is_some() {
            debug!(kind, "Template registration replaced");
        } else {
            debug!(kind, "Template registered");
        }
        Ok(())
    }

    /// Stores a named partial config for a kind registered here.
    pub fn register_variant(&mut self, kind: &str, name: &str, config: TemplateConfig) -> Result<()> {
        if !self.templates.contains_key(kind) {
            return Err(GenerationError::UnknownKind(kind.to_string()));
        }
        if name.trim().is_empty() {
            return Err(GenerationError::InvalidConfig("variant name must not be empty".to_string()));
        }
        config.validate()?;

        self.variants
            .entry(kind.to_string())
            .or_default()
            .insert(name.to_string(), config);
        Ok(())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.templates.contains_key(kind) || self.parent.as_ref().is_some_and(|p| p.contains(kind))
    }

    fn content(&self, kind: &str) -> Result<&Arc<dyn TemplateContent>> {
        match self.templates.get(kind) {
            Some(content) => Ok(content),
            None => match &self.parent {
                Some(parent) => parent.content(kind),
                None => Err(GenerationError::UnknownKind(kind.to_string())),
            },
        }
    }

    // == Config Resolution ==
    /// `defaults <- variant <- config <- brand`, shallow and rightmost-wins.
    ///
    /// The variant layer applies only when `config.variant` names a variant
    /// registered for `kind`.
    pub fn merged_config(
        &self,
        kind: &str,
        config: Option<&TemplateConfig>,
        brand: Option<&BrandConfig>,
    ) -> Result<TemplateConfig> {
        if !self.templates.contains_key(kind) {
            return match &self.parent {
                Some(parent) => parent.merged_config(kind, config, brand),
                None => Err(GenerationError::UnknownKind(kind.to_string())),
            };
        }

        let defaults = self.content(kind)?.default_config();
        let caller = config.cloned().unwrap_or_default();
        caller.validate()?;
        if let Some(brand) = brand {
            brand.validate()?;
        }

        let variant = caller
            .variant
            .as_deref()
            .and_then(|name| self.variants.get(kind)?.get(name))
            .cloned()
            .unwrap_or_default();

        let merged = defaults.merge(&variant).merge(&caller);
        Ok(match brand {
            Some(brand) => merged.with_brand(brand),
            None => merged,
        })
    }

    // == Create ==
    pub fn create(&self, kind: &str, data: Value, config: Option<&TemplateConfig>) -> Result<DocumentTemplate> {
        self.create_branded(kind, data, config, None)
    }

    /// Builds a template instance and records one use of `kind`.
    pub fn create_branded(
        &self,
        kind: &str,
        data: Value,
        config: Option<&TemplateConfig>,
        brand: Option<&BrandConfig>,
    ) -> Result<DocumentTemplate> {
        let content = self.content(kind)?.clone();
        let merged = self.merged_config(kind, config, brand)?;

        self.usage.record(kind);
        debug!(kind, variant = merged.variant.as_deref().unwrap_or(DEFAULT_VARIANT), "Template created");
        Ok(DocumentTemplate::new(kind, content, data, merged))
    }

    // == Introspection ==
    /// Kind -> variant names, including the parent chain.
    pub fn available_kinds(&self) -> BTreeMap<String, Vec<String>> {
        let mut kinds = self
            .parent
            .as_ref()
            .map(|parent| parent.available_kinds())
            .unwrap_or_default();

        for kind in self.templates.keys() {
            let variants: Vec<String> = self
                .variants
                .get(kind)
                .map(|v| v.keys().cloned().collect())
                .filter(|v: &Vec<String>| !v.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_VARIANT.to_string()]);
            kinds.insert(kind.clone(), variants);
        }
        kinds
    }

    pub fn data_schema(&self, kind: &str) -> Result<Value> {
        Ok(self.content(kind)?.data_schema())
    }

    /// Checks `data` against the kind's schema: required fields and the
    /// JSON type of declared properties. Advisory; `create` never calls it.
    pub fn validate_data(&self, kind: &str, data: &Value) -> Result<Vec<String>> {
        let schema = self.data_schema(kind)?;
        let Some(fields) = data.as_object() else {
            return Ok(vec!["Data must be an object".to_string()]);
        };

        let mut violations = Vec::new();
        for field in schema["required"].as_array().into_iter().flatten().filter_map(Value::as_str) {
            if !fields.contains_key(field) {
                violations.push(format!("Missing required field: {field}"));
            }
        }
        if let Some(properties) = schema["properties"].as_object() {
            for (field, spec) in properties {
                let (Some(value), Some(expected)) = (fields.get(field), spec["type"].as_str()) else {
                    continue;
                };
                if !matches_type(value, expected) {
                    violations.push(format!("Field '{field}' should be of type {expected}"));
                }
            }
        }
        Ok(violations)
    }

    pub fn usage_analytics(&self) -> UsageAnalytics {
        self.usage.snapshot()
    }
}

fn is_valid_kind(kind: &str) -> bool {
    !kind.is_empty() && kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ColorPalette;
    use crate::template::{BuildContext, ColorSpec, DocumentElement, PageSize};
    use proptest::prelude::*;
    use serde_json::json;

    struct Stub(TemplateConfig);

    impl TemplateContent for Stub {
        fn default_config(&self) -> TemplateConfig {
            self.0.clone()
        }

        fn build_content(&self, _ctx: &BuildContext<'_>) -> Result<Vec<DocumentElement>> {
            Ok(Vec::new())
        }
    }

    fn stub() -> Arc<dyn TemplateContent> {
        Arc::new(Stub(TemplateConfig::default()))
    }

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        let defaults = TemplateConfig::builder()
            .palette("professional")
            .show_header(true)
            .option("show_macros", true)
            .build()
            .unwrap();
        registry.register("nutrition", Arc::new(Stub(defaults))).unwrap();
        registry
            .register_variant(
                "nutrition",
                "simple",
                TemplateConfig::builder().option("show_macros", false).palette("monochrome").build().unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_unknown_kind_records_no_usage() {
        let registry = registry();
        let result = registry.create("nonexistent_kind", json!({}), Some(&TemplateConfig::default()));

        assert!(matches!(result, Err(GenerationError::UnknownKind(kind)) if kind == "nonexistent_kind"));
        assert!(!registry.usage_analytics().by_kind.contains_key("nonexistent_kind"));
        assert_eq!(registry.usage_analytics().total_generations, 0);
    }

    #[test]
    fn test_variant_then_caller_layering() {
        let registry = registry();
        let caller = TemplateConfig::builder().variant("simple").palette("vibrant").build().unwrap();

        let merged = registry.merged_config("nutrition", Some(&caller), None).unwrap();
        assert_eq!(merged.colors, Some(ColorSpec::Named("vibrant".to_string())));
        assert!(!merged.flag("show_macros", true));
        assert_eq!(merged.show_header, Some(true));
    }

    #[test]
    fn test_unknown_variant_is_ignored() {
        let registry = registry();
        let caller = TemplateConfig::builder().variant("glossy").build().unwrap();

        let merged = registry.merged_config("nutrition", Some(&caller), None).unwrap();
        assert!(merged.flag("show_macros", false));
        assert_eq!(merged.variant.as_deref(), Some("glossy"));
    }

    #[test]
    fn test_brand_is_last_layer() {
        let registry = registry();
        let brand = BrandConfig {
            colors: Some(ColorPalette::from([("primary".to_string(), "#123456".to_string())])),
            brand_name: Some("Peak".to_string()),
            ..BrandConfig::default()
        };
        let caller = TemplateConfig::builder()
            .colors(ColorPalette::from([
                ("primary".to_string(), "#000000".to_string()),
                ("accent".to_string(), "#111111".to_string()),
            ]))
            .build()
            .unwrap();

        let merged = registry.merged_config("nutrition", Some(&caller), Some(&brand)).unwrap();
        let colors = merged.colors.unwrap().resolve();
        assert_eq!(colors["primary"], "#123456");
        assert_eq!(colors["accent"], "#111111");
        assert_eq!(merged.brand.unwrap().name.as_deref(), Some("Peak"));
    }

    #[test]
    fn test_invalid_caller_config_rejected() {
        let registry = registry();
        let caller: TemplateConfig = serde_json::from_value(json!({"colors": {"primary": "red"}})).unwrap();

        let result = registry.create("nutrition", json!({}), Some(&caller));
        assert!(matches!(result, Err(GenerationError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_brand_rejected() {
        let registry = registry();
        let brand = BrandConfig {
            colors: Some(ColorPalette::from([("text_primary".to_string(), "red".to_string())])),
            ..BrandConfig::default()
        };

        let result = registry.create_branded("nutrition", json!({}), None, Some(&brand));
        assert!(matches!(result, Err(GenerationError::InvalidConfig(_))));
        assert_eq!(registry.usage_analytics().total_generations, 0);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = TemplateRegistry::new();
        registry.register("session", stub()).unwrap();
        let letter = TemplateConfig::builder().page_size(PageSize::Letter).build().unwrap();
        registry.register("session", Arc::new(Stub(letter))).unwrap();

        let template = registry.create("session", json!({}), None).unwrap();
        assert_eq!(template.merged_config().page_size, Some(PageSize::Letter));
    }

    #[test]
    fn test_register_rejects_bad_kind_and_defaults() {
        let mut registry = TemplateRegistry::new();
        assert!(matches!(registry.register("", stub()), Err(GenerationError::InvalidTemplate(_))));
        assert!(matches!(registry.register("a b", stub()), Err(GenerationError::InvalidTemplate(_))));

        let bad = TemplateConfig {
            max_preview_pages: Some(0),
            ..TemplateConfig::default()
        };
        assert!(matches!(
            registry.register("session", Arc::new(Stub(bad))),
            Err(GenerationError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_register_variant_requires_kind() {
        let mut registry = TemplateRegistry::new();
        let result = registry.register_variant("session", "modern", TemplateConfig::default());
        assert!(matches!(result, Err(GenerationError::UnknownKind(_))));
    }

    #[test]
    fn test_parent_fallback_and_shared_usage() {
        let parent = Arc::new(registry());
        let mut child = TemplateRegistry::with_parent(parent.clone());
        child.register("session_premium", stub()).unwrap();

        assert!(child.create("session_premium", json!({}), None).is_ok());
        let fallback = child
            .create("nutrition", json!({}), Some(&TemplateConfig::builder().variant("simple").build().unwrap()))
            .unwrap();
        assert!(!fallback.merged_config().flag("show_macros", true));
        assert!(matches!(child.create("invoice", json!({}), None), Err(GenerationError::UnknownKind(_))));

        let analytics = child.usage_analytics();
        assert_eq!(analytics.total_generations, 2);
        assert_eq!(analytics.most_used.unwrap().kind, "session_premium");
        assert_eq!(parent.usage_analytics().total_generations, 2);
    }

    #[test]
    fn test_available_kinds() {
        let empty = TemplateRegistry::new();
        assert!(empty.available_kinds().is_empty());

        let mut child = TemplateRegistry::with_parent(Arc::new(registry()));
        child.register("workout_elite", stub()).unwrap();

        let kinds = child.available_kinds();
        assert_eq!(kinds["nutrition"], vec!["simple"]);
        assert_eq!(kinds["workout_elite"], vec![DEFAULT_VARIANT]);
    }

    #[test]
    fn test_validate_data() {
        let registry = registry();

        let violations = registry.validate_data("nutrition", &json!({"notes": "x"})).unwrap();
        assert_eq!(violations, vec!["Missing required field: title"]);

        let violations = registry.validate_data("nutrition", &json!({"title": 3})).unwrap();
        assert_eq!(violations, vec!["Field 'title' should be of type string"]);

        assert!(registry.validate_data("nutrition", &json!({"title": "Plan"})).unwrap().is_empty());
        assert_eq!(registry.validate_data("nutrition", &json!([])).unwrap(), vec!["Data must be an object"]);
        assert!(registry.validate_data("invoice", &json!({})).is_err());
    }

    // == Config Layering Property ==
    fn options_strategy() -> impl Strategy<Value = BTreeMap<String, bool>> {
        prop::collection::btree_map("opt_[a-e]", any::<bool>(), 0..5)
    }

    fn with_options(options: &BTreeMap<String, bool>) -> TemplateConfig {
        TemplateConfig {
            options: options.iter().map(|(k, v)| (k.clone(), Value::Bool(*v))).collect(),
            ..TemplateConfig::default()
        }
    }

    proptest! {
        #[test]
        fn prop_merged_config_layers_rightmost_wins(
            defaults in options_strategy(),
            variant in options_strategy(),
            caller in options_strategy(),
        ) {
            let mut registry = TemplateRegistry::new();
            registry.register("session", Arc::new(Stub(with_options(&defaults)))).unwrap();
            registry.register_variant("session", "v", with_options(&variant)).unwrap();

            let mut caller_config = with_options(&caller);
            caller_config.variant = Some("v".to_string());
            let merged = registry.merged_config("session", Some(&caller_config), None).unwrap();

            let mut expected = defaults.clone();
            expected.extend(variant.clone());
            expected.extend(caller.clone());
            for (key, value) in &expected {
                prop_assert_eq!(merged.flag(key, !value), *value);
            }
            prop_assert_eq!(merged.options.len(), expected.len());
        }
    }
}
