//! Removal of prompt text that leaks into model output.
//!
//! A completion is first unwrapped from a surrounding markdown fence and cut
//! down to its first heading outside any code block.  The regex rules then run
//! in table order.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy)]
pub struct CleanupRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

pub const CLEANUP_RULES: &[CleanupRule] = &[
    CleanupRule {
        name: "instructions",
        pattern: r"Instructions:[^\n]*\n?",
        replacement: "",
    },
    CleanupRule {
        name: "format",
        pattern: r"Format[^\n]*?markdown[^\n]*\n?",
        replacement: "",
    },
    CleanupRule {
        name: "include",
        pattern: r"Include:[^\n]*\n?",
        replacement: "",
    },
    CleanupRule {
        name: "important",
        pattern: r"Important:[^\n]*\n?",
        replacement: "",
    },
    CleanupRule {
        name: "context",
        pattern: r"Context:[^\n]*\n?",
        replacement: "",
    },
    CleanupRule {
        name: "blank-runs",
        pattern: r"\n{3,}",
        replacement: "\n\n",
    },
];

static COMPILED: LazyLock<Vec<(CleanupRule, Regex)>> = LazyLock::new(|| {
    CLEANUP_RULES
        .iter()
        .map(|rule| (*rule, compile(rule)))
        .collect()
});

fn compile(rule: &CleanupRule) -> Regex {
    Regex::new(rule.pattern)
        .unwrap_or_else(|e| panic!("cleanup rule {:?} has an invalid pattern: {e}", rule.name))
}

fn run<'t>(rule: &CleanupRule, re: &Regex, text: &'t str) -> Cow<'t, str> {
    re.replace_all(text, rule.replacement)
}

/// Info strings of a fence that wraps a whole markdown answer.
const MARKDOWN_FENCE_INFO: &[&str] = &["", "markdown", "md"];

pub(crate) fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Level of an ATX heading line, if `line` is one.
pub(crate) fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    let rest = &line[hashes..];
    ((1..=6).contains(&hashes) && (rest.is_empty() || rest.starts_with([' ', '\t'])))
        .then_some(hashes)
}

/// Remove a markdown fence pair that encloses the entire text.
///
/// Fences tagged with a code language are left alone, as are fences whose
/// content is not itself fence-balanced.
pub fn strip_wrapping_fence(text: &str) -> &str {
    let text = text.trim();
    let Some((first, rest)) = text.split_once('\n') else {
        return text;
    };
    let first = first.trim();
    let Some(marker) = ["```", "~~~"].into_iter().find(|m| first.starts_with(m)) else {
        return text;
    };
    let info = first[marker.len()..].trim().to_ascii_lowercase();
    if !MARKDOWN_FENCE_INFO.contains(&info.as_str()) {
        return text;
    }
    let inner = match rest.trim_end().rsplit_once('\n') {
        Some((inner, last)) if last.trim() == marker => inner,
        None if rest.trim() == marker => "",
        _ => return text,
    };
    // An odd fence count inside means the first block closes early.
    if inner.lines().filter(|l| is_fence(l)).count() % 2 != 0 {
        return text;
    }
    inner.trim()
}

/// Byte offset of the first heading line that is not inside a code fence.
pub(crate) fn first_heading_offset(text: &str) -> Option<usize> {
    let mut offset = 0;
    let mut in_fence = false;
    for line in text.split_inclusive('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && heading_level(line.trim()).is_some() {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Discard everything before the first heading outside a code fence.
/// Text without such a heading is returned unchanged.
pub fn drop_preamble(text: &str) -> &str {
    match first_heading_offset(text) {
        Some(offset) => &text[offset..],
        None => text,
    }
}

/// Unwrap and trim the raw completion, drop its preamble, run every rule in
/// order, and trim again.
pub fn clean_output(raw: &str) -> String {
    let mut text = drop_preamble(strip_wrapping_fence(raw)).trim().to_string();
    for (rule, re) in COMPILED.iter() {
        let replaced = match run(rule, re, &text) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        };
        if let Some(s) = replaced {
            text = s;
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_rule(rule: &CleanupRule, text: &str) -> String {
        run(rule, &compile(rule), text).into_owned()
    }

    fn rule(name: &str) -> &'static CleanupRule {
        CLEANUP_RULES.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn every_rule_compiles() {
        assert_eq!(COMPILED.len(), CLEANUP_RULES.len());
    }

    #[test]
    fn preamble_drops_text_before_first_heading() {
        let out = drop_preamble("Sure! Here is the section:\n\n# Overview\nBody\n## Sub");
        assert_eq!(out, "# Overview\nBody\n## Sub");
    }

    #[test]
    fn preamble_keeps_text_without_heading() {
        assert_eq!(drop_preamble("plain text only"), "plain text only");
    }

    #[test]
    fn preamble_ignores_inline_hash() {
        assert_eq!(drop_preamble("Use C# today\n## Setup\nok"), "## Setup\nok");
    }

    #[test]
    fn preamble_skips_fenced_comments() {
        let text = "Try this:\n```bash\n# list pets\ncurl /pets\n```\nDone.";
        assert_eq!(drop_preamble(text), text);

        let text = "```sh\n# setup\n```\n# Overview\nBody";
        assert_eq!(drop_preamble(text), "# Overview\nBody");
    }

    #[test]
    fn wrapping_markdown_fence_is_removed() {
        assert_eq!(strip_wrapping_fence("```markdown\n# Overview\nx\n```"), "# Overview\nx");
        assert_eq!(strip_wrapping_fence("~~~\n## A\n~~~\n"), "## A");
        assert_eq!(strip_wrapping_fence("```md\n```"), "");
    }

    #[test]
    fn code_fences_are_not_unwrapped() {
        let code = "```bash\ncurl /pets\n```";
        assert_eq!(strip_wrapping_fence(code), code);
        let unbalanced = "```markdown\n# Overview\nbody";
        assert_eq!(strip_wrapping_fence(unbalanced), unbalanced);
        let closes_early = "```markdown\n# A\n```\ntail\n```";
        assert_eq!(strip_wrapping_fence(closes_early), closes_early);
    }

    #[test]
    fn nested_code_block_survives_unwrapping() {
        let raw = "```markdown\n## Quick Start\n```bash\ncurl /pets\n```\n```";
        assert_eq!(strip_wrapping_fence(raw), "## Quick Start\n```bash\ncurl /pets\n```");
    }

    #[test]
    fn fenced_answer_cleans_to_balanced_markdown() {
        let out = clean_output("```markdown\n# Overview\nThe Pets API.\n```");
        assert_eq!(out, "# Overview\nThe Pets API.");

        let out = clean_output("Here:\n```yaml\n# config\nkey: 1\n```\n# Glossary\nPet: an animal.");
        assert_eq!(out, "# Glossary\nPet: an animal.");
        assert_eq!(out.matches("```").count() % 2, 0);
    }

    #[test]
    fn instruction_lines_are_removed() {
        let out = apply_rule(rule("instructions"), "# A\nInstructions: do x\nbody\n");
        assert_eq!(out, "# A\nbody\n");
    }

    #[test]
    fn format_lines_need_markdown_mention() {
        let rule = rule("format");
        assert_eq!(apply_rule(rule, "Format as markdown, please\nkeep\n"), "keep\n");
        assert_eq!(apply_rule(rule, "Formatting tips\n"), "Formatting tips\n");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(apply_rule(rule("blank-runs"), "a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(apply_rule(rule("blank-runs"), "a\n\nb"), "a\n\nb");
    }

    #[test]
    fn clean_output_runs_full_table() {
        let raw = "  Here you go.\n# Authentication\nContext: leaked\nImportant: leaked\n\n\n\nUse OAuth2.\nInclude: leaked\n  ";
        assert_eq!(clean_output(raw), "# Authentication\n\nUse OAuth2.");
    }

    #[test]
    fn clean_output_of_blank_is_empty() {
        assert_eq!(clean_output("   \n\n  "), "");
    }
}
