pub mod context;

mod huggingface;
mod openrouter;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, LlmConfig};
use crate::error::{DocSynthError, Result};

pub use context::{GenerateRequest, GenerationParams};

// -- Plugin trait -----------------------------------------------------------

/// Trait that all LLM backends implement.  Allows dynamic dispatch so the
/// documentation pipeline never depends on a concrete inference service, and
/// tests can substitute a stub that returns canned completions.
#[async_trait::async_trait]
pub trait LlmBackend: Send + Sync {
    /// Human-readable name of this backend (e.g. "Hugging Face Inference API").
    fn name(&self) -> &str;

    /// Run one text completion and return only the generated continuation.
    ///
    /// An empty string is a valid answer; callers substitute placeholders.
    async fn generate(&self, req: &GenerateRequest<'_>) -> Result<String>;
}

// -- Plugin registry --------------------------------------------------------

/// Registry of available LLM backends.
pub struct LlmPluginRegistry {
    backends: HashMap<String, Arc<dyn LlmBackend>>,
}

impl LlmPluginRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register a new backend plugin.
    pub fn register(&mut self, key: &str, backend: Arc<dyn LlmBackend>) {
        info!(backend = key, name = backend.name(), "LLM plugin registered");
        self.backends.insert(key.to_string(), backend);
    }

    /// Get a registered backend by key.
    pub fn get(&self, key: &str) -> Option<Arc<dyn LlmBackend>> {
        self.backends.get(key).cloned()
    }

    /// List all registered backend keys, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.backends.keys().cloned().collect();
        keys.sort();
        keys
    }
}

// -- Trait implementations for built-in backends ----------------------------

#[async_trait::async_trait]
impl LlmBackend for huggingface::HuggingFaceEngine {
    fn name(&self) -> &str { "Hugging Face Inference API" }
    async fn generate(&self, req: &GenerateRequest<'_>) -> Result<String> {
        self.generate(req).await
    }
}

#[async_trait::async_trait]
impl LlmBackend for openrouter::OpenRouterEngine {
    fn name(&self) -> &str { "OpenRouter API" }
    async fn generate(&self, req: &GenerateRequest<'_>) -> Result<String> {
        self.generate(req).await
    }
}

// -- LlmEngine (wraps active backend + sampling settings) -------------------

/// Inference configuration object shared by every generator call.
///
/// Built once at startup and passed by reference (usually behind an `Arc`).
/// Holds the selected backend plus the per-call sampling presets.
///
/// Built-in backends:
/// - **huggingface** -- Hugging Face Inference API text generation (default)
/// - **openrouter**  -- OpenRouter chat completions
pub struct LlmEngine {
    active: Arc<dyn LlmBackend>,
    active_key: String,
    plugins: LlmPluginRegistry,
    section: GenerationParams,
    subsection: GenerationParams,
    questions: GenerationParams,
}

impl LlmEngine {
    /// Build the engine from config.
    ///
    /// The backend is selected by `config.llm.backend` (overridable with the
    /// `LLM_BACKEND` environment variable).  A missing API key for the
    /// selected backend is a configuration error.
    pub fn new(config: &Config) -> Result<Self> {
        let backend = std::env::var("LLM_BACKEND")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| config.llm.backend.clone());

        let mut plugins = LlmPluginRegistry::new();
        let mut failures: HashMap<&str, DocSynthError> = HashMap::new();

        match huggingface::HuggingFaceEngine::new(config) {
            Ok(engine) => plugins.register("huggingface", Arc::new(engine)),
            Err(e) => {
                failures.insert("huggingface", e);
            }
        }
        match openrouter::OpenRouterEngine::new(config) {
            Ok(engine) => plugins.register("openrouter", Arc::new(engine)),
            Err(e) => {
                failures.insert("openrouter", e);
            }
        }

        let active = match plugins.get(&backend) {
            Some(b) => {
                info!(backend = %backend, name = b.name(), "LLM backend selected");
                b
            }
            None => {
                if let Some(err) = failures.remove(backend.as_str()) {
                    return Err(err);
                }
                return Err(DocSynthError::Config(format!(
                    "unknown LLM backend \"{backend}\" (available: [huggingface, openrouter])"
                )));
            }
        };

        for (key, err) in &failures {
            warn!(backend = key, "LLM backend unavailable: {err}");
        }

        Ok(Self::assemble(backend, active, plugins, &config.llm))
    }

    /// Build an engine around an explicit backend, bypassing env lookups.
    pub fn with_backend(key: &str, backend: Arc<dyn LlmBackend>, config: &LlmConfig) -> Self {
        let mut plugins = LlmPluginRegistry::new();
        plugins.register(key, backend.clone());
        Self::assemble(key.to_string(), backend, plugins, config)
    }

    fn assemble(
        active_key: String,
        active: Arc<dyn LlmBackend>,
        plugins: LlmPluginRegistry,
        config: &LlmConfig,
    ) -> Self {
        Self {
            active,
            active_key,
            plugins,
            section: GenerationParams::section(config),
            subsection: GenerationParams::subsection(config),
            questions: GenerationParams::questions(config),
        }
    }

    /// Run one completion on the active backend.
    pub async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.active
            .generate(&GenerateRequest { prompt, params })
            .await
    }

    pub fn section_params(&self) -> &GenerationParams {
        &self.section
    }

    pub fn subsection_params(&self) -> &GenerationParams {
        &self.subsection
    }

    pub fn questions_params(&self) -> &GenerationParams {
        &self.questions
    }

    /// List all available backend keys.
    pub fn available_backends(&self) -> Vec<String> {
        self.plugins.list()
    }

    /// Return a human-readable description of the active backend.
    pub fn backend_info(&self) -> &str {
        self.active.name()
    }

    /// Return the key of the active backend.
    pub fn active_backend(&self) -> &str {
        &self.active_key
    }
}
