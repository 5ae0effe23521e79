use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{env_or, Config};
use crate::error::{DocSynthError, Result};
use crate::llm::context::GenerateRequest;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// LLM engine backed by the Hugging Face Inference API text-generation task.
///
/// Sends `POST {base_url}/models/{model}` with the raw prompt as `inputs`.
///
/// Configuration priority (highest -> lowest):
///   1. Environment variables (`HUGGING_FACE_API_KEY`, `HUGGING_FACE_BASE_URL`)
///   2. `[llm]` section of `config.toml`
///   3. Built-in defaults
pub struct HuggingFaceEngine {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: TextGenerationParameters,
}

#[derive(Serialize)]
struct TextGenerationParameters {
    max_new_tokens: usize,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_full_text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    do_sample: Option<bool>,
}

#[derive(Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: Option<String>,
}

/// The API answers with a list for batched inputs and a bare object otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextGenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl TextGenerationResponse {
    fn into_text(self) -> String {
        let first = match self {
            Self::Batch(items) => items.into_iter().next(),
            Self::Single(item) => Some(item),
        };
        first
            .and_then(|g| g.generated_text)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

impl HuggingFaceEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = env_or("HUGGING_FACE_API_KEY", &config.llm.huggingface_api_key)
            .ok_or_else(|| {
                DocSynthError::Config(
                    "Hugging Face API key required: set HUGGING_FACE_API_KEY env var \
                     or huggingface_api_key in config"
                        .into(),
                )
            })?;

        let base_url = env_or("HUGGING_FACE_BASE_URL", &config.llm.huggingface_base_url)
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
            "Hugging Face engine initialized"
        );

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    pub async fn generate(&self, req: &GenerateRequest<'_>) -> Result<String> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let params = req.params;

        let body = TextGenerationRequest {
            inputs: req.prompt,
            parameters: TextGenerationParameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                repetition_penalty: params.repetition_penalty,
                return_full_text: params.return_full_text,
                do_sample: params.do_sample,
            },
        };

        debug!(
            model = %self.model,
            prompt_len = req.prompt.len(),
            max_new_tokens = params.max_new_tokens,
            "invoking Hugging Face text generation"
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
                .unwrap_or(error_text);

            warn!(status = %status, error = %error_msg, "Hugging Face API error");

            return Err(DocSynthError::Llm(format!(
                "Hugging Face API returned {status}: {error_msg}"
            )));
        }

        let parsed: TextGenerationResponse = resp.json().await.map_err(|e| {
            DocSynthError::Llm(format!("failed to parse Hugging Face response: {e}"))
        })?;

        let response = parsed.into_text().trim().to_string();

        info!(
            response_len = response.len(),
            model = %self.model,
            "Hugging Face response received"
        );

        if response.is_empty() {
            warn!(model = %self.model, "Hugging Face returned empty completion");
        }

        Ok(response)
    }
}
