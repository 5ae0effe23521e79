use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{env_or, Config};
use crate::error::{DocSynthError, Result};
use crate::llm::context::GenerateRequest;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// LLM engine backed by the OpenRouter API.
///
/// OpenRouter provides an OpenAI-compatible chat completions endpoint that
/// routes to hundreds of models via a single API key.  The documentation
/// prompt is sent as a single user message.
///
/// Configuration priority (highest → lowest):
///   1. Environment variables (`OPENROUTER_API_KEY`, `OPENROUTER_BASE_URL`, `LLM_MODEL`)
///   2. `[llm]` section of `config.toml`
///   3. Built-in defaults
pub struct OpenRouterEngine {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

// -- OpenAI-compatible request/response types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenRouterEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = env_or("OPENROUTER_API_KEY", &config.llm.openrouter_api_key)
            .ok_or_else(|| {
                DocSynthError::Config(
                    "OpenRouter API key required: set OPENROUTER_API_KEY env var \
                     or openrouter_api_key in config"
                        .into(),
                )
            })?;

        let base_url = env_or("OPENROUTER_BASE_URL", &config.llm.openrouter_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = env_or("LLM_MODEL", &config.llm.model)
            .ok_or_else(|| DocSynthError::Config("no model configured".into()))?;

        let timeout_secs = config.llm.timeout_secs;
        let mut builder = Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build()?;

        info!(
            model = %model,
            base_url = %base_url,
            timeout_secs,
            "OpenRouter engine initialized"
        );

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    /// Send the prompt to OpenRouter and return the plain-text response.
    pub async fn generate(&self, req: &GenerateRequest<'_>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let params = req.params;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: req.prompt.to_string(),
            }],
            max_tokens: params.max_new_tokens,
            temperature: if params.do_sample == Some(false) {
                0.0
            } else {
                params.temperature
            },
            top_p: params.top_p,
            repetition_penalty: params.repetition_penalty,
        };

        debug!(
            model = %self.model,
            prompt_len = req.prompt.len(),
            max_tokens = params.max_new_tokens,
            "invoking OpenRouter API"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();

        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            let error_msg = serde_json::from_str::<ErrorResponse>(&error_text)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_text);

            warn!(status = %status, error = %error_msg, "OpenRouter API error");

            return Err(DocSynthError::Llm(format!(
                "OpenRouter API returned {status}: {error_msg}"
            )));
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| {
            DocSynthError::Llm(format!("failed to parse OpenRouter response: {e}"))
        })?;

        if let Some(ref usage) = chat_resp.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenRouter usage"
            );
        }

        let response = chat_resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        info!(
            response_len = response.len(),
            model = %self.model,
            "OpenRouter response received"
        );

        if response.is_empty() {
            warn!(model = %self.model, "OpenRouter returned empty completion");
        }

        Ok(response)
    }
}
