use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{DocSynthError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed to call the API from a browser.  Empty means any.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub llm: LlmConfig,
}

// -- LLM -----------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Backend to use: "huggingface" (default) or "openrouter".
    /// Can be overridden with the `LLM_BACKEND` env var.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Model identifier passed to the backend.
    /// Can be overridden with the `LLM_MODEL` env var.
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP timeout in seconds for a single completion (0 = no timeout).
    #[serde(default)]
    pub timeout_secs: u64,

    // -- Hugging Face settings (backend = "huggingface") --

    /// Hugging Face Inference API key.
    /// Can be overridden with the `HUGGING_FACE_API_KEY` env var.
    #[serde(default)]
    pub huggingface_api_key: String,

    /// Inference API base URL (default: "https://api-inference.huggingface.co").
    /// Can be overridden with the `HUGGING_FACE_BASE_URL` env var.
    #[serde(default)]
    pub huggingface_base_url: String,

    // -- OpenRouter settings (backend = "openrouter") --

    /// OpenRouter API key.
    /// Can be overridden with the `OPENROUTER_API_KEY` env var.
    #[serde(default)]
    pub openrouter_api_key: String,

    /// OpenRouter API base URL (default: "https://openrouter.ai/api/v1").
    /// Can be overridden with the `OPENROUTER_BASE_URL` env var.
    #[serde(default)]
    pub openrouter_base_url: String,

    // -- Sampling --

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-P (nucleus) sampling threshold.
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Repetition penalty (0.0 = backend default).
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,

    /// New-token budget for a top-level section.
    #[serde(default = "default_section_max_tokens")]
    pub section_max_tokens: usize,

    /// New-token budget for a Getting Started subsection.
    #[serde(default = "default_subsection_max_tokens")]
    pub subsection_max_tokens: usize,

    /// New-token budget for the follow-up questions.
    #[serde(default = "default_questions_max_tokens")]
    pub questions_max_tokens: usize,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_backend() -> String {
    "huggingface".to_string()
}
fn default_model() -> String {
    "mistralai/Mixtral-8x7B-Instruct-v0.1".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_top_p() -> f32 {
    0.8
}
fn default_repetition_penalty() -> f32 {
    1.1
}
fn default_section_max_tokens() -> usize {
    1000
}
fn default_subsection_max_tokens() -> usize {
    500
}
fn default_questions_max_tokens() -> usize {
    200
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            timeout_secs: 0,
            huggingface_api_key: String::new(),
            huggingface_base_url: String::new(),
            openrouter_api_key: String::new(),
            openrouter_base_url: String::new(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
            section_max_tokens: default_section_max_tokens(),
            subsection_max_tokens: default_subsection_max_tokens(),
            questions_max_tokens: default_questions_max_tokens(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_allowed_origins: Vec::new(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the given path, or the default location.  A missing
    /// file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(),
        };

        let config = if config_path.exists() {
            info!("loading config from {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path).map_err(DocSynthError::Io)?;
            toml::from_str(&contents)
                .map_err(|e| DocSynthError::Config(format!("parse error: {e}")))?
        } else {
            info!("no config file found, using defaults");
            Config::default()
        };

        Ok(config)
    }

    /// Returns the default config file path: `$XDG_CONFIG_HOME/doc-synth/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("doc-synth")
            .join("config.toml")
    }

    /// Generate the default config file contents.
    pub fn default_config_contents() -> &'static str {
        include_str!("../config.example.toml")
    }
}

/// Resolve a setting from an env var, then a config value, skipping empties.
pub fn env_or(var: &str, configured: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| {
            if configured.is_empty() {
                None
            } else {
                Some(configured.to_string())
            }
        })
}
