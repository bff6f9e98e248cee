//! Parsing of the AI service's free-text replies
//!
//! Replies are expected to hold one JSON object, possibly wrapped in a
//! markdown fence or surrounded by prose, and sometimes cut off mid-object.

use patentsearch_core::enrichment::MAX_ANNOTATIONS;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// Annotations shorter than this (in characters) are discarded
pub const MIN_ANNOTATION_CHARS: usize = 5;
/// Annotations longer than this are cut and end with `...`
pub const MAX_ANNOTATION_CHARS: usize = 100;

static TRAILING_COMMA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").ok());
static FEATURE_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&label_pattern("特徵|功能")).ok());
static EFFECT_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&label_pattern("功效|效果")).ok());

/// A leading bullet and/or enumeration label, such as `特徵1：`, `2、` or
/// `- 1.`. A label word only counts when a number or colon follows it.
fn label_pattern(words: &str) -> String {
    let label = format!(r"(?:(?:{words})\s*(?:\d+\s*[:：.、]?|[:：])|\d+\s*[、):：]|\d+\.)");
    format!(r"(?s)^\s*(?:-\s*{label}?|{label})\s*(?P<body>.*)$")
}

/// Strip markdown code fences from a reply.
pub fn strip_markdown_fences(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let after_fence = match trimmed.find('\n') {
        Some(newline_pos) => &trimmed[newline_pos + 1..],
        None => trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed),
    };

    match after_fence.rfind("```") {
        Some(close_pos) => after_fence[..close_pos].trim(),
        None => after_fence.trim(),
    }
}

/// The balanced `{...}` span starting at the first `{`, if it closes
pub fn first_balanced_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let candidate = &content[start..];
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in candidate.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&candidate[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes trailing commas and closes whatever brackets are still open
pub fn repair_truncated_json(text: &str) -> String {
    let mut repaired = match TRAILING_COMMA.as_ref() {
        Some(pattern) => pattern.replace_all(text, "$1").into_owned(),
        None => text.to_string(),
    };

    let mut open = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;
    for c in repaired.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }

    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = open.pop() {
        repaired.push(closer);
    }
    repaired
}

/// Reads the JSON object out of a reply, repairing it once if needed
pub fn parse_reply(reply: &str) -> Option<Value> {
    let content = strip_markdown_fences(reply);

    if let Some(object) = first_balanced_object(content) {
        match serde_json::from_str::<Value>(object) {
            Ok(value) if value.is_object() => return Some(value),
            Ok(_) => {}
            Err(e) => debug!("Reply JSON did not parse, attempting repair: {e}"),
        }
    }

    let start = content.find('{')?;
    let repaired = repair_truncated_json(&content[start..]);
    let span = first_balanced_object(&repaired)?;
    serde_json::from_str::<Value>(span)
        .ok()
        .filter(Value::is_object)
}

/// Which list an annotation belongs to; decides the stripped label prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Feature,
    Effect,
}

impl AnnotationKind {
    fn label(self) -> &'static LazyLock<Option<Regex>> {
        match self {
            AnnotationKind::Feature => &FEATURE_LABEL,
            AnnotationKind::Effect => &EFFECT_LABEL,
        }
    }
}

/// Cleans one list of annotations from a parsed reply.
///
/// Drops non-strings and entries under [`MIN_ANNOTATION_CHARS`], strips
/// enumeration labels, caps each entry's length and keeps at most
/// [`MAX_ANNOTATIONS`] entries.
pub fn post_process(items: Option<&Value>, kind: AnnotationKind) -> Vec<String> {
    let Some(items) = items.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|item| item.chars().count() >= MIN_ANNOTATION_CHARS)
        .map(|item| strip_label(item, kind))
        .filter(|item| item.chars().count() >= MIN_ANNOTATION_CHARS)
        .map(cap_length)
        .take(MAX_ANNOTATIONS)
        .collect()
}

fn strip_label(item: &str, kind: AnnotationKind) -> String {
    let Some(body) = kind
        .label()
        .as_ref()
        .and_then(|pattern| pattern.captures(item))
        .and_then(|captures| captures.name("body"))
    else {
        return item.to_string();
    };

    // "2.5D" is a number, not item 2
    let label = &item[..body.start()];
    let decimal = label.trim_end().ends_with('.')
        && body.as_str().starts_with(|c: char| c.is_ascii_digit());
    if decimal {
        return item.to_string();
    }
    body.as_str().trim().to_string()
}

fn cap_length(item: String) -> String {
    if item.chars().count() <= MAX_ANNOTATION_CHARS {
        return item;
    }
    let kept: String = item.chars().take(MAX_ANNOTATION_CHARS - 3).collect();
    format!("{kept}...")
}
