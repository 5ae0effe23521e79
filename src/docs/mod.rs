//! Documentation synthesis pipeline.
//!
//! `generate_documentation` fans out the four single-prompt sections and the
//! Getting Started composer, assembles them in a fixed order, then asks for
//! follow-up questions about the assembled text.

pub mod cleanup;
pub mod extract;
pub mod getting_started;
pub mod prompts;
pub mod questions;
pub mod section;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{DocSynthError, Result};
use crate::llm::LlmEngine;

pub use getting_started::generate_getting_started;
pub use questions::parse_follow_up_questions;
pub use section::{generate_section, Section};

pub const RETRY_QUESTION: &str = "Would you like to try again?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Assistant,
    User,
}

/// One turn of the clarifying chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// The assistant turn that opens the clarifying chat.
    pub fn opening() -> Self {
        Self {
            role: ChatRole::Assistant,
            content: prompts::CHAT_OPENING.to_string(),
        }
    }

    /// The scripted assistant answer to the latest user turn, chosen by what
    /// the assistant last asked.
    pub fn reply(history: &[ChatMessage]) -> Self {
        let last_asked = history
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
            .map_or("", |m| m.content.as_str());

        let content = if last_asked.contains("primary audience") {
            prompts::CHAT_FOLLOW_UP
        } else if last_asked.contains("authentication examples") {
            prompts::CHAT_WRAP_UP
        } else {
            prompts::CHAT_READY
        };

        Self {
            role: ChatRole::Assistant,
            content: content.to_string(),
        }
    }
}

/// Final output of a documentation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub documentation: String,
    pub follow_up_questions: Vec<String>,
}

impl GenerationResult {
    /// Result reported when a run fails; embeds the error message.
    pub fn failed(err: &DocSynthError) -> Self {
        Self {
            documentation: format!(
                "# Error\nFailed to generate documentation: {err}. Please try again."
            ),
            follow_up_questions: vec![RETRY_QUESTION.to_string()],
        }
    }

    /// Result reported when a request is rejected before generation.
    pub fn rejected() -> Self {
        Self {
            documentation: "# Error\nFailed to generate documentation. Please try again."
                .to_string(),
            follow_up_questions: vec![RETRY_QUESTION.to_string()],
        }
    }
}

/// Generate the full documentation bundle.  Never fails: any error is
/// logged and turned into an error document.
pub async fn generate_documentation(
    engine: &LlmEngine,
    spec: &str,
    notes: &str,
    chat: Option<&[ChatMessage]>,
) -> GenerationResult {
    info!(
        spec_len = spec.len(),
        has_notes = !notes.trim().is_empty(),
        chat_messages = chat.map_or(0, <[ChatMessage]>::len),
        backend = engine.active_backend(),
        "starting documentation generation"
    );

    match try_generate_documentation(engine, spec, notes, chat).await {
        Ok(result) => {
            info!(
                doc_len = result.documentation.len(),
                questions = result.follow_up_questions.len(),
                "documentation generated"
            );
            result
        }
        Err(e) => {
            error!("documentation generation failed: {e}");
            GenerationResult::failed(&e)
        }
    }
}

async fn try_generate_documentation(
    engine: &LlmEngine,
    spec: &str,
    notes: &str,
    chat: Option<&[ChatMessage]>,
) -> Result<GenerationResult> {
    let (overview, authentication, getting_started, error_handling, glossary) = futures::try_join!(
        generate_section(engine, Section::Overview, spec, notes, chat),
        generate_section(engine, Section::Authentication, spec, notes, chat),
        generate_getting_started(engine, spec, notes, chat),
        generate_section(engine, Section::ErrorHandling, spec, notes, chat),
        generate_section(engine, Section::Glossary, spec, notes, chat),
    )?;

    let documentation = [
        overview,
        authentication,
        getting_started,
        error_handling,
        glossary,
    ]
    .join("\n\n");

    let questions_raw = engine
        .generate(
            &prompts::questions_prompt(&documentation),
            engine.questions_params(),
        )
        .await?;

    Ok(GenerationResult {
        documentation,
        follow_up_questions: parse_follow_up_questions(&questions_raw),
    })
}
