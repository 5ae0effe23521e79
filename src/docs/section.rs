use std::fmt;

use tracing::{debug, warn};

use super::cleanup::clean_output;
use super::extract::extract_context;
use super::prompts::section_prompt;
use super::ChatMessage;
use crate::error::Result;
use crate::llm::LlmEngine;

/// Top-level documentation sections generated from a single prompt each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Overview,
    Authentication,
    ErrorHandling,
    Glossary,
}

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Authentication => "Authentication",
            Section::ErrorHandling => "Error Handling",
            Section::Glossary => "Glossary",
        }
    }

    /// Markdown returned when the model produced nothing usable.
    pub fn placeholder(self) -> String {
        format!("# {}\nNo content generated for this section.", self.title())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Generate one section with a single completion call.
///
/// Inference errors are returned to the caller; an empty or fully stripped
/// completion becomes the section placeholder.
pub async fn generate_section(
    engine: &LlmEngine,
    section: Section,
    spec: &str,
    notes: &str,
    chat: Option<&[ChatMessage]>,
) -> Result<String> {
    let ctx = extract_context(spec);
    debug!(%section, title = %ctx.title, paths = ?ctx.path_names(), "spec context extracted");
    let prompt = section_prompt(section, &ctx, notes, chat);

    debug!(%section, prompt_len = prompt.len(), "generating section");
    let raw = engine.generate(&prompt, engine.section_params()).await?;

    let cleaned = clean_output(&raw);
    if cleaned.is_empty() {
        warn!(%section, "no usable content generated, using placeholder");
        return Ok(section.placeholder());
    }
    debug!(%section, len = cleaned.len(), "section generated");
    Ok(cleaned)
}
