use futures::future::try_join_all;
use tracing::{debug, warn};

use super::cleanup::{first_heading_offset, heading_level, is_fence, strip_wrapping_fence};
use super::prompts::{subsection_prompt, Subsection, GETTING_STARTED_SUBSECTIONS};
use super::ChatMessage;
use crate::error::Result;
use crate::llm::LlmEngine;

pub const GETTING_STARTED_HEADING: &str = "# Getting Started";

/// Force a subsection body under exactly one `## <title>` heading.
///
/// A markdown fence wrapping the whole body is removed first.  Text before
/// the first heading outside a code fence is dropped, that heading is replaced
/// by the canonical one, and any other `#`/`##` heading outside a code fence
/// is demoted to `###` so the composed block keeps its four-heading outline.
pub fn normalize_subsection(title: &str, body: &str) -> String {
    let body = strip_wrapping_fence(body);
    let rest = match first_heading_offset(body) {
        Some(offset) => body[offset..].split_once('\n').map_or("", |(_, rest)| rest),
        None => body,
    };

    let mut out = vec![format!("## {title}")];
    let mut in_fence = false;
    for line in rest.lines() {
        let trimmed = line.trim_start();
        if is_fence(trimmed) {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }
        match heading_level(trimmed) {
            Some(level) if !in_fence && level <= 2 => {
                out.push(format!("###{}", &trimmed[level..]));
            }
            _ => out.push(line.to_string()),
        }
    }

    out.join("\n").trim_end().to_string()
}

async fn generate_subsection(
    engine: &LlmEngine,
    sub: &Subsection,
    spec: &str,
    notes: &str,
    chat: Option<&[ChatMessage]>,
) -> Result<String> {
    let prompt = subsection_prompt(sub, spec, notes, chat);
    debug!(subsection = sub.title, prompt_len = prompt.len(), "generating subsection");

    let raw = engine.generate(&prompt, engine.subsection_params()).await?;
    let raw = raw.trim();
    if raw.is_empty() {
        warn!(subsection = sub.title, "no content generated, using placeholder");
        return Ok(format!(
            "## {}\nNo content generated for this subsection.",
            sub.title
        ));
    }
    Ok(normalize_subsection(sub.title, raw))
}

/// Generate the four Getting Started subsections concurrently and join them
/// in their fixed order under one heading.
pub async fn generate_getting_started(
    engine: &LlmEngine,
    spec: &str,
    notes: &str,
    chat: Option<&[ChatMessage]>,
) -> Result<String> {
    let parts = try_join_all(
        GETTING_STARTED_SUBSECTIONS
            .iter()
            .map(|sub| generate_subsection(engine, sub, spec, notes, chat)),
    )
    .await?;

    Ok(format!("{GETTING_STARTED_HEADING}\n\n{}", parts.join("\n\n")))
}
