//! Parsing of the follow-up questions completion.
//!
//! List markers are only recognised at the start of a line, so prose such as
//! "version 2. Next" is never split.

use std::sync::LazyLock;

use regex::Regex;

pub const MAX_FOLLOW_UP_QUESTIONS: usize = 3;

pub const FALLBACK_QUESTIONS: [&str; 3] = [
    "How can we improve the documentation clarity?",
    "What additional examples would be helpful?",
    "Are there any sections that need more detail?",
];

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}[.)]|[-*•])(?:\s+|$)(.*)$").expect("valid list marker regex")
});

/// Split a completion into at most three questions, falling back to
/// [`FALLBACK_QUESTIONS`] when nothing usable is found.
pub fn parse_follow_up_questions(raw: &str) -> Vec<String> {
    let mut marked: Vec<String> = Vec::new();
    let mut unmarked: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            marked.extend(current.take());
            continue;
        }
        if let Some(caps) = MARKER_RE.captures(line) {
            marked.extend(current.take());
            current = Some(caps[1].trim().to_string());
        } else if let Some(q) = current.as_mut() {
            q.push(' ');
            q.push_str(line);
        } else if !line.ends_with(':') {
            unmarked.push(line.to_string());
        }
    }
    marked.extend(current.take());

    let candidates = if marked.is_empty() { unmarked } else { marked };
    let questions: Vec<String> = candidates
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(MAX_FOLLOW_UP_QUESTIONS)
        .collect();

    if questions.is_empty() {
        FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
    } else {
        questions
    }
}
