//! Text preparation before anything is sent to the AI service

use patentsearch_core::record::{is_placeholder, CanonicalPatentRecord};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_ABSTRACT_CHARS: usize = 1000;
pub const MAX_CLAIMS_CHARS: usize = 800;
/// Budget for title, abstract and claims together
pub const MAX_PATENT_TEXT_CHARS: usize = 2000;
pub const MAX_DESCRIPTION_CHARS: usize = 1500;

/// Delimiters a description may be cut at, in order of preference
const CUT_DELIMITERS: [char; 5] = ['.', '。', ',', '，', ' '];

/// Collapses whitespace runs and drops control characters
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Cuts a description to `max` characters, at a sentence or word boundary
/// when that keeps more than 80% of the budget.
pub fn truncate_description(text: &str, max: usize) -> &str {
    let truncated = truncate_chars(text, max);
    if truncated.len() == text.len() {
        return text;
    }
    for delimiter in CUT_DELIMITERS {
        if let Some(pos) = truncated.rfind(delimiter) {
            if truncated[..pos].chars().count() * 10 > max * 8 {
                return &truncated[..pos + delimiter.len_utf8()];
            }
        }
    }
    truncated
}

/// Cleaned, length-capped sections of one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatentText {
    pub title: String,
    pub abstract_text: String,
    pub claims: String,
}

impl PatentText {
    /// Prepares a record's text; sections share [`MAX_PATENT_TEXT_CHARS`] in order
    pub fn from_record(record: &CanonicalPatentRecord) -> Self {
        let mut budget = MAX_PATENT_TEXT_CHARS;
        let mut take = |raw: &str, cap: usize| -> String {
            if is_placeholder(raw) {
                return String::new();
            }
            let cleaned = clean_text(raw);
            let kept = truncate_chars(&cleaned, cap.min(budget)).to_string();
            budget = budget.saturating_sub(kept.chars().count());
            kept
        };

        let title = take(&record.title, MAX_TITLE_CHARS);
        let abstract_text = take(&record.abstract_text, MAX_ABSTRACT_CHARS);
        let claims = take(&record.claims, MAX_CLAIMS_CHARS);
        Self {
            title,
            abstract_text,
            claims,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.abstract_text.is_empty() && self.claims.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.title.chars().count() + self.abstract_text.chars().count() + self.claims.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\n\tb \u{1}c  "), "a b c");
        assert_eq!(clean_text("\u{7}"), "");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("探針卡結構", 2), "探針");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_description_prefers_delimiter() {
        let text = format!("{}。{}", "a".repeat(90), "b".repeat(20));
        assert_eq!(truncate_description(&text, 100), format!("{}。", "a".repeat(90)));
    }

    #[test]
    fn test_truncate_description_hard_cut_without_late_delimiter() {
        let text = format!("{}. {}", "a".repeat(10), "b".repeat(200));
        assert_eq!(truncate_description(&text, 100).chars().count(), 100);
    }

    #[test]
    fn test_patent_text_budget() {
        let mut record = CanonicalPatentRecord::with_title("t".repeat(300));
        record.abstract_text = "a".repeat(1500);
        record.claims = "c".repeat(1500);

        let text = PatentText::from_record(&record);
        assert_eq!(text.title.len(), MAX_TITLE_CHARS);
        assert_eq!(text.abstract_text.len(), MAX_ABSTRACT_CHARS);
        assert_eq!(text.claims.len(), MAX_CLAIMS_CHARS);
        assert!(text.char_count() <= MAX_PATENT_TEXT_CHARS);
    }

    #[test]
    fn test_placeholders_are_skipped() {
        let text = PatentText::from_record(&CanonicalPatentRecord::with_title("Probe"));
        assert_eq!(text.title, "Probe");
        assert!(text.abstract_text.is_empty());
        assert!(text.claims.is_empty());
    }
}
