//! Prompt templates for every generation call.

use super::extract::SpecContext;
use super::section::Section;
use super::ChatMessage;

/// A fixed Getting Started subsection.
#[derive(Debug, Clone, Copy)]
pub struct Subsection {
    pub title: &'static str,
    pub instruction: &'static str,
}

pub const GETTING_STARTED_SUBSECTIONS: [Subsection; 4] = [
    Subsection {
        title: "Prerequisites",
        instruction: "List required credentials, tools, dependencies, and knowledge. \
                      Use [Insert <requirement> here] for missing details.",
    },
    Subsection {
        title: "Quick Start Guide",
        instruction: "Create a step-by-step guide. \
                      Use [Insert <step detail> here] for missing information.",
    },
    Subsection {
        title: "Basic Operations",
        instruction: "Include 2-3 examples of common operations. \
                      Use [Insert <example detail> here] for missing specifics.",
    },
    Subsection {
        title: "Next Steps",
        instruction: "Suggest advanced usage and improvements. \
                      Use [Insert <suggestion> here] for missing recommendations.",
    },
];

/// First assistant turn of the clarifying chat.
pub const CHAT_OPENING: &str = "I've reviewed your OpenAPI specification and meeting notes. \
Let me ask a few questions to better understand your documentation needs:\n\n\
1. What's the primary audience for this documentation?\n\
2. Are there specific endpoints that need detailed explanation?\n\
3. Would you like to include code examples in specific languages?";

/// Assistant turn answering the opening questions.
pub const CHAT_FOLLOW_UP: &str = "Thank you for that information. A few more questions:\n\n\
1. Should we include authentication examples?\n\
2. Are there any specific error scenarios that need detailed documentation?";

/// Assistant turn answering the follow-up questions.
pub const CHAT_WRAP_UP: &str = "I understand. Feel free to ask any other questions, \
or click 'Generate Documentation' when you're ready to proceed.";

/// Assistant turn once the scripted questions are exhausted.
pub const CHAT_READY: &str = "I understand. Let me know if you have any other questions, \
or click 'Generate Documentation' when you're ready to proceed.";

fn list_or(items: &[&str], detail: &str) -> String {
    if items.is_empty() {
        format!("[Insert {detail} here]")
    } else {
        items.join(", ")
    }
}

fn field_or(value: &str, detail: &str) -> String {
    if value.trim().is_empty() {
        format!("[Insert {detail} here]")
    } else {
        value.to_string()
    }
}

fn strings(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

fn endpoint_list(ctx: &SpecContext) -> String {
    let endpoints: Vec<String> = ctx
        .paths
        .iter()
        .map(|p| {
            if p.operations.is_empty() {
                p.path.clone()
            } else {
                format!("{} ({})", p.path, p.operations.join(", ").to_uppercase())
            }
        })
        .collect();
    list_or(&strings(&endpoints), "endpoint list")
}

/// Chat contents, one message per line.
pub fn flatten_chat(chat: Option<&[ChatMessage]>) -> Option<String> {
    chat.filter(|msgs| !msgs.is_empty()).map(|msgs| {
        msgs.iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn section_body(section: Section, ctx: &SpecContext) -> String {
    let security = list_or(&ctx.security_scheme_names(), "security schemes");
    let schemas = list_or(&strings(&ctx.schema_names), "data models");
    let scopes = list_or(&strings(&ctx.scopes), "OAuth scopes");

    match section {
        Section::Overview => format!(
            r##"Generate a clear and concise "Overview" section for the API.

Context:
Title: {title}
Version: {version}
Available Endpoints: {endpoints}
Security: {security}

Instructions:
- If any information is missing, use placeholders like: [Insert <missing detail> here]
- Start with "# Overview"
- Keep content clear and concise"##,
            title = field_or(&ctx.title, "API title"),
            version = field_or(&ctx.version, "API version"),
            endpoints = endpoint_list(ctx),
        ),
        Section::Authentication => format!(
            r##"Generate an "Authentication" section for the API documentation.

Context:
Security Schemes: {security}
Available Scopes: {scopes}

Instructions:
- If security details are missing, use placeholders: [Insert <security detail> here]
- Start with "# Authentication"
- Include authentication flow if available"##
        ),
        Section::ErrorHandling => format!(
            r##"Generate an "Error Handling" section for the API documentation.

Context:
Endpoints: {endpoints}
Data Models: {schemas}

Instructions:
- For missing error codes or descriptions, use: [Insert <error detail> here]
- Start with "# Error Handling"
- Use tables for error codes and descriptions"##,
            endpoints = endpoint_list(ctx),
        ),
        Section::Glossary => format!(
            r##"Generate a "Glossary" section for the API documentation.

Context:
Security Terms: {security}
Data Models: {schemas}
Scopes: {scopes}

Instructions:
- For undefined terms, use: [Insert <term definition> here]
- Start with "# Glossary"
- List terms alphabetically"##
        ),
    }
}

/// Full prompt for one top-level section.
pub fn section_prompt(
    section: Section,
    ctx: &SpecContext,
    notes: &str,
    chat: Option<&[ChatMessage]>,
) -> String {
    let notes = if notes.trim().is_empty() {
        "[No meeting notes provided]".to_string()
    } else {
        format!("Meeting Notes:\n{}\n", notes.trim())
    };
    let discussion = match flatten_chat(chat) {
        Some(lines) => format!("Discussion Points:\n{lines}"),
        None => "[No discussion points available]".to_string(),
    };

    format!(
        r##"You are a technical writer. Generate documentation based on this context:

{body}

Additional Context:
{notes}
{discussion}

Important:
- When information is missing, use placeholders: [Insert <detail> here]
- Start directly with the section header
- Do not include any instructions or prompts in the output
- Keep content clear and concise
- Use proper markdown formatting"##,
        body = section_body(section, ctx),
    )
}

/// Prompt for one Getting Started subsection.  Embeds the raw spec text.
pub fn subsection_prompt(
    sub: &Subsection,
    spec: &str,
    notes: &str,
    chat: Option<&[ChatMessage]>,
) -> String {
    let mut context = spec.to_string();
    if !notes.trim().is_empty() {
        context.push_str("\n\nAdditional Notes:\n");
        context.push_str(notes.trim());
    }
    if let Some(lines) = flatten_chat(chat) {
        context.push_str("\n\nDiscussion Points:\n");
        context.push_str(&lines);
    }

    format!(
        r###"Generate the "{title}" subsection for the Getting Started guide.

Context:
{context}

Instructions:
{instruction}

Format as markdown, starting with "## {title}".
Keep the content practical and implementation-agnostic.
Focus on clear, actionable guidance."###,
        title = sub.title,
        instruction = sub.instruction,
    )
}

/// Prompt asking for follow-up questions about assembled documentation.
pub fn questions_prompt(documentation: &str) -> String {
    format!(
        "Based on this documentation, suggest three specific follow-up questions for improvement:\n\n\
         {documentation}\n\n\
         Generate three concise follow-up questions as a numbered list."
    )
}
