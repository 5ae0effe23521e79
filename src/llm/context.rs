use crate::config::LlmConfig;

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: usize,
    pub temperature: f32,
    /// Nucleus-sampling threshold.
    pub top_p: f32,
    pub repetition_penalty: Option<f32>,
    /// When `Some(false)` the backend returns only the generated continuation.
    pub return_full_text: Option<bool>,
    /// When `Some(false)` the backend decodes deterministically.
    pub do_sample: Option<bool>,
}

impl GenerationParams {
    fn with_budget(config: &LlmConfig, max_new_tokens: usize) -> Self {
        Self {
            max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            repetition_penalty: (config.repetition_penalty > 0.0)
                .then_some(config.repetition_penalty),
            return_full_text: Some(false),
            do_sample: Some(false),
        }
    }

    /// Parameters for a top-level documentation section.
    pub fn section(config: &LlmConfig) -> Self {
        Self::with_budget(config, config.section_max_tokens)
    }

    /// Parameters for one Getting Started subsection.
    pub fn subsection(config: &LlmConfig) -> Self {
        Self::with_budget(config, config.subsection_max_tokens)
    }

    /// Parameters for the follow-up questions request.
    pub fn questions(config: &LlmConfig) -> Self {
        Self::with_budget(config, config.questions_max_tokens)
    }
}

/// Per-call generation request passed to every LlmBackend::generate invocation.
///
/// Borrowed from the call site so concurrent section calls share nothing.
pub struct GenerateRequest<'a> {
    /// The full prompt text.
    pub prompt: &'a str,
    pub params: &'a GenerationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_follow_config() {
        let config = LlmConfig::default();
        assert_eq!(GenerationParams::section(&config).max_new_tokens, 1000);
        assert_eq!(GenerationParams::subsection(&config).max_new_tokens, 500);
        assert_eq!(GenerationParams::questions(&config).max_new_tokens, 200);
    }

    #[test]
    fn deterministic_continuation_only() {
        let params = GenerationParams::section(&LlmConfig::default());
        assert_eq!(params.return_full_text, Some(false));
        assert_eq!(params.do_sample, Some(false));
        assert_eq!(params.repetition_penalty, Some(1.1));
    }

    #[test]
    fn zero_repetition_penalty_is_omitted() {
        let config = LlmConfig {
            repetition_penalty: 0.0,
            ..LlmConfig::default()
        };
        assert!(GenerationParams::questions(&config).repetition_penalty.is_none());
    }
}
