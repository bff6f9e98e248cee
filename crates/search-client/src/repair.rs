//! Ordered repairs for the malformations the search service is known to emit
//!
//! Every regex stage matches an escaped backslash pair (`\\`) as its first
//! alternative and writes it back unchanged, so a valid escape is never split
//! in half. Stripping stages run before the escape-doubling stage.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

/// One named regex rewrite
struct RepairStage {
    name: &'static str,
    pattern: &'static LazyLock<Option<Regex>>,
    rewrite: fn(&Captures<'_>) -> String,
}

static OPERATOR_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\\(\\|[<>=%#&+])").ok());
static CJK_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\\(\\|\p{Han})").ok());
static DIGIT_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\\(\\|[0-9])").ok());
static INVALID_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"\\(\\|["/bfnrt]|u[0-9a-fA-F]{4})?"#).ok());
static TRAILING_COMMA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").ok());

/// Drops the backslash unless it starts an escaped backslash pair
fn strip_backslash(caps: &Captures<'_>) -> String {
    let target = caps.get(1).map_or("", |m| m.as_str());
    if target == "\\" {
        "\\\\".to_string()
    } else {
        target.to_string()
    }
}

/// Keeps valid escapes, doubles a lone backslash
fn escape_lone_backslash(caps: &Captures<'_>) -> String {
    match caps.get(1) {
        Some(_) => caps.get(0).map_or_else(String::new, |m| m.as_str().to_string()),
        None => "\\\\".to_string(),
    }
}

fn drop_trailing_comma(caps: &Captures<'_>) -> String {
    caps.get(1).map_or_else(String::new, |m| m.as_str().to_string())
}

static STAGES: &[RepairStage] = &[
    RepairStage {
        name: "operator escapes",
        pattern: &OPERATOR_ESCAPE,
        rewrite: strip_backslash,
    },
    RepairStage {
        name: "CJK escapes",
        pattern: &CJK_ESCAPE,
        rewrite: strip_backslash,
    },
    RepairStage {
        name: "digit escapes",
        pattern: &DIGIT_ESCAPE,
        rewrite: strip_backslash,
    },
    RepairStage {
        name: "invalid escapes",
        pattern: &INVALID_ESCAPE,
        rewrite: escape_lone_backslash,
    },
    RepairStage {
        name: "trailing commas",
        pattern: &TRAILING_COMMA,
        rewrite: drop_trailing_comma,
    },
];

/// Applies every repair stage in order, then escapes raw control characters
/// that appear inside string literals.
pub fn repair_json(text: &str) -> String {
    let mut repaired = text.to_string();
    for stage in STAGES {
        let Some(pattern) = stage.pattern.as_ref() else {
            continue;
        };
        let next = pattern
            .replace_all(&repaired, |caps: &Captures<'_>| (stage.rewrite)(caps))
            .into_owned();
        if next != repaired {
            debug!("JSON repair stage '{}' changed the payload", stage.name);
            repaired = next;
        }
    }
    escape_control_chars(&repaired)
}

/// Escapes control characters inside JSON strings; structure outside strings is untouched
pub fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}

/// Returns the balanced `{...}` objects that are direct elements of the
/// array starting at `start` (which must point at `[`). Scanning stops at the
/// closing bracket or at the first object that never closes.
pub fn array_objects(text: &str, start: usize) -> Vec<&str> {
    let mut objects = Vec::new();
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return objects;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut object_start = None;

    for (offset, &b) in bytes.iter().enumerate().skip(start + 1) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    object_start = Some(offset);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = object_start.take() {
                        if let Some(object) = text.get(begin..=offset) {
                            objects.push(object);
                        }
                    }
                }
            }
            b'[' if depth == 0 => return objects,
            b']' if depth == 0 => return objects,
            _ => {}
        }
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_backslash_before_cjk_is_dropped() {
        let repaired = repair_json(r#"{"title":"\測試"}"#);
        assert_eq!(parse(&repaired), json!({"title": "測試"}));
    }

    #[test]
    fn test_backslash_before_operators_and_digits() {
        let repaired = repair_json(r#"{"a":"x \< y \= z \+ 1\2"}"#);
        assert_eq!(parse(&repaired), json!({"a": "x < y = z + 12"}));
    }

    #[test]
    fn test_valid_escapes_survive() {
        let original = r#"{"a":"line\nnext \"q\" \\ C:\\temp \u00e9 \/"}"#;
        assert_eq!(parse(&repair_json(original)), parse(original));
    }

    #[test]
    fn test_escaped_backslash_before_digit_is_kept() {
        let original = r#"{"path":"C:\\1"}"#;
        assert_eq!(parse(&repair_json(original)), json!({"path": "C:\\1"}));
    }

    #[test]
    fn test_lone_backslash_is_doubled() {
        let repaired = repair_json(r#"{"a":"x\qy"}"#);
        assert_eq!(parse(&repaired), json!({"a": "x\\qy"}));
    }

    #[test]
    fn test_control_chars_inside_strings() {
        let repaired = repair_json("{\"a\":\"one\ntwo\u{1}\"}");
        assert_eq!(parse(&repaired), json!({"a": "one\ntwo\u{1}"}));
    }

    #[test]
    fn test_trailing_commas() {
        let repaired = repair_json(r#"{"a":[1,2,],}"#);
        assert_eq!(parse(&repaired), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_array_objects_stop_at_unclosed_object() {
        let text = r#"[{"a":"}"},{"b":{"c":1}},{"d":"#;
        let objects = array_objects(text, 0);
        assert_eq!(objects, vec![r#"{"a":"}"}"#, r#"{"b":{"c":1}}"#]);
    }
}
