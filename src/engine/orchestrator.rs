//! Generation Orchestrator Module
//!
//! Top-level API: cache lookup, template creation, off-thread builds,
//! result persistence and statistics.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStats, ResultCache};
use crate::config::Config;
use crate::engine::{BatchResult, DocumentJob, EngineContext};
use crate::error::{GenerationError, Result};
use crate::registry::{TemplateRegistry, UsageAnalytics};
use crate::style::{BrandConfig, StyleResolver};
use crate::template::builtin::{professional_registry, standard_registry};
use crate::template::{
    DocumentTemplate, RenderBackend, TemplateConfig, TemplateContent, TextBackend, DEFAULT_PREVIEW_PAGES,
};

// == Request ==
/// One document to generate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TemplateConfig>,
    /// Applied after the template is created; not part of the cache key
    #[serde(default, alias = "styleOverrides", skip_serializing_if = "Option::is_none")]
    pub style_overrides: Option<TemplateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandConfig>,
}

impl GenerationRequest {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: TemplateConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_style_overrides(mut self, overrides: TemplateConfig) -> Self {
        self.style_overrides = Some(overrides);
        self
    }

    pub fn with_brand(mut self, brand: BrandConfig) -> Self {
        self.brand = Some(brand);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("kind must not be empty".to_string()));
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        if let Some(overrides) = &self.style_overrides {
            overrides.validate()?;
        }
        if let Some(brand) = &self.brand {
            brand.validate()?;
        }
        Ok(())
    }
}

// == Report ==
/// Metadata about one `generate` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub cached: bool,
    /// Zero for cache hits
    #[serde(rename = "generation_time", serialize_with = "serialize_secs")]
    pub time: Duration,
    pub size: usize,
    /// Unknown for cache hits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_documents: u64,
    #[serde(serialize_with = "serialize_secs")]
    pub total_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub average_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

// == Generation Orchestrator ==
pub struct GenerationOrchestrator {
    registry: StdRwLock<TemplateRegistry>,
    /// None when caching is disabled
    cache: Option<Arc<RwLock<ResultCache>>>,
    backend: Arc<dyn RenderBackend>,
    context: EngineContext,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("cache_enabled", &self.cache.is_some())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl GenerationOrchestrator {
    // == Constructors ==
    pub fn new(
        registry: TemplateRegistry,
        cache: Option<ResultCache>,
        backend: Arc<dyn RenderBackend>,
        context: EngineContext,
    ) -> Self {
        Self {
            registry: StdRwLock::new(registry),
            cache: cache.map(|c| Arc::new(RwLock::new(c))),
            backend,
            context,
        }
    }

    /// Bundled kinds, the text backend, themes and cache as configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = professional_registry(Arc::new(standard_registry()?))?;
        let cache = if config.cache_enabled {
            Some(ResultCache::open(
                &config.cache_dir,
                config.cache_max_size_bytes(),
                config.default_ttl(),
            )?)
        } else {
            None
        };
        let context = EngineContext::new(StyleResolver::load(&config.themes_path));

        info!(
            cache_enabled = config.cache_enabled,
            cache_dir = %config.cache_dir.display(),
            "Generation orchestrator ready"
        );
        Ok(Self::new(registry, cache, Arc::new(TextBackend::new()), context))
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Shared cache handle, e.g. for a cleanup task.
    pub fn cache_handle(&self) -> Option<Arc<RwLock<ResultCache>>> {
        self.cache.clone()
    }

    // == Generate ==
    /// Generates one document into `sink`.
    ///
    /// A cache hit writes the cached bytes and reports zero time. A miss
    /// builds on the blocking pool, writes to `sink`, then caches the bytes.
    pub async fn generate<W: Write + Send>(&self, request: &GenerationRequest, sink: &mut W) -> Result<GenerationReport> {
        request.validate()?;
        let brand = self.effective_brand(request);
        let key = cache_key(request, brand.as_ref())?;

        if let Some(bytes) = self.cached(&key).await? {
            sink.write_all(&bytes)?;
            sink.flush()?;
            debug!(kind = %request.kind, %key, size = bytes.len(), "Served from cache");
            return Ok(GenerationReport {
                cached: true,
                time: Duration::ZERO,
                size: bytes.len(),
                pages: None,
            });
        }

        let started = Instant::now();
        let template = self.create_template(request, brand.as_ref())?;
        let (bytes, pages) = self.build_off_thread(template).await?;

        sink.write_all(&bytes)?;
        sink.flush()?;

        let bytes = self.store(&key, bytes).await?;

        let elapsed = started.elapsed();
        self.context.record_generation(elapsed);
        info!(
            kind = %request.kind,
            size = bytes.len(),
            pages,
            elapsed_ms = elapsed.as_millis() as u64,
            "Document generated"
        );

        Ok(GenerationReport {
            cached: false,
            time: elapsed,
            size: bytes.len(),
            pages: Some(pages),
        })
    }

    /// Generates into a file, creating parent directories. Nothing is
    /// written when generation fails.
    pub async fn generate_to_file(&self, request: &GenerationRequest, path: &Path) -> Result<GenerationReport> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut bytes = Vec::new();
        let report = self.generate(request, &mut bytes).await?;
        fs::write(path, &bytes)?;
        Ok(report)
    }

    // == Preview ==
    /// Builds a truncated document in memory. Never reads or writes the cache.
    pub async fn generate_preview(&self, request: &GenerationRequest, max_pages: Option<usize>) -> Result<Vec<u8>> {
        request.validate()?;
        let brand = self.effective_brand(request);
        let mut template = self.create_template(request, brand.as_ref())?;

        let pages = max_pages
            .or(template.merged_config().max_preview_pages)
            .unwrap_or(DEFAULT_PREVIEW_PAGES);
        template.set_preview_mode(true, pages);

        let (bytes, _) = self.build_off_thread(template).await?;
        debug!(kind = %request.kind, max_pages = pages, size = bytes.len(), "Preview generated");
        Ok(bytes)
    }

    // == Batch ==
    /// Generates every job into `out_dir`, one after another. A failing job
    /// is recorded and the rest still run.
    pub async fn batch_generate(&self, jobs: &[DocumentJob], out_dir: &Path) -> Vec<BatchResult> {
        if let Err(err) = fs::create_dir_all(out_dir) {
            warn!(dir = %out_dir.display(), error = %err, "Cannot create batch output directory");
        }

        let extension = self.backend.file_extension();
        let mut results = Vec::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            let filename = job.output_filename(index, extension);
            let path = out_dir.join(&filename);
            match self.generate_to_file(&job.request, &path).await {
                Ok(report) => results.push(BatchResult::succeeded(filename, path, report)),
                Err(err) => {
                    warn!(kind = %job.request.kind, %filename, error = %err, "Batch job failed");
                    results.push(BatchResult::failed(filename, err));
                }
            }
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(jobs = jobs.len(), succeeded, "Batch finished");
        results
    }

    // == Blocking Wrappers ==
    /// [`Self::generate`] for callers without an async runtime. Panics if
    /// called from within a runtime.
    pub fn generate_blocking<W: Write + Send>(&self, request: &GenerationRequest, sink: &mut W) -> Result<GenerationReport> {
        blocking_runtime()?.block_on(self.generate(request, sink))
    }

    pub fn batch_generate_blocking(&self, jobs: &[DocumentJob], out_dir: &Path) -> Result<Vec<BatchResult>> {
        Ok(blocking_runtime()?.block_on(self.batch_generate(jobs, out_dir)))
    }

    // == Passthroughs ==
    pub async fn performance_stats(&self) -> PerformanceStats {
        let stats = self.context.generation_stats();
        let cache = match &self.cache {
            Some(cache) => Some(cache.read().await.stats()),
            None => None,
        };
        PerformanceStats {
            total_documents: stats.total_documents,
            total_time: stats.total_time,
            average_time: stats.average_time(),
            cache,
        }
    }

    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().await.clear();
            info!("Result cache cleared");
        }
    }

    pub fn register_template(&self, kind: &str, content: Arc<dyn TemplateContent>) -> Result<()> {
        self.registry_mut().register(kind, content)
    }

    pub fn available_kinds(&self) -> BTreeMap<String, Vec<String>> {
        self.registry().available_kinds()
    }

    pub fn usage_analytics(&self) -> UsageAnalytics {
        self.registry().usage_analytics()
    }

    pub fn data_schema(&self, kind: &str) -> Result<Value> {
        self.registry().data_schema(kind)
    }

    pub fn validate_data(&self, kind: &str, data: &Value) -> Result<Vec<String>> {
        self.registry().validate_data(kind, data)
    }

    // == Internals ==
    fn registry(&self) -> std::sync::RwLockReadGuard<'_, TemplateRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_mut(&self) -> std::sync::RwLockWriteGuard<'_, TemplateRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request brand, else the studio-wide brand settings.
    fn effective_brand(&self, request: &GenerationRequest) -> Option<BrandConfig> {
        request
            .brand
            .clone()
            .or_else(|| self.context.styles().brand_settings().cloned())
    }

    fn create_template(&self, request: &GenerationRequest, brand: Option<&BrandConfig>) -> Result<DocumentTemplate> {
        let mut template =
            self.registry()
                .create_branded(&request.kind, request.data.clone(), request.config.as_ref(), brand)?;

        if let Some(overrides) = &request.style_overrides {
            template.apply_style_overrides(overrides);
        }
        if let Some(theme) = template.merged_config().theme.clone() {
            let styles = self.context.styles().template_styles(&request.kind, &theme);
            template.use_theme(styles);
        }
        Ok(template)
    }

    /// Cache lookup on the blocking pool; the lock is released before the
    /// caller touches its sink.
    async fn cached(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let cache = Arc::clone(cache);
        let key = key.as_str().to_string();
        tokio::task::spawn_blocking(move || cache.blocking_write().get(&key))
            .await
            .map_err(|err| GenerationError::Internal(format!("cache lookup failed: {err}")))
    }

    async fn store(&self, key: &CacheKey, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let Some(cache) = &self.cache else {
            return Ok(bytes);
        };
        let cache = Arc::clone(cache);
        let key = key.as_str().to_string();
        tokio::task::spawn_blocking(move || {
            cache.blocking_write().set(&key, &bytes, None);
            bytes
        })
        .await
        .map_err(|err| GenerationError::Internal(format!("cache write failed: {err}")))
    }

    async fn build_off_thread(&self, mut template: DocumentTemplate) -> Result<(Vec<u8>, usize)> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || {
            let mut bytes = Vec::new();
            let pages = template.build(backend.as_ref(), &mut bytes)?;
            Ok::<_, GenerationError>((bytes, pages))
        })
        .await
        .map_err(|err| GenerationError::Internal(format!("build task failed: {err}")))?
    }
}

/// Key over (kind, data, config); the brand joins the config part only
/// when one applies.
fn cache_key(request: &GenerationRequest, brand: Option<&BrandConfig>) -> Result<CacheKey> {
    let config = serde_json::to_value(request.config.clone().unwrap_or_default())?;
    let config = match brand {
        Some(brand) => json!({"config": config, "brand": serde_json::to_value(brand)?}),
        None => config,
    };
    Ok(CacheKey::compute(&request.kind, &request.data, &config))
}

fn blocking_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}
