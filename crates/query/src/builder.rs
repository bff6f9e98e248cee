//! Rendering of keyword groups into the search service's boolean grammar

use patentsearch_core::{BooleanQuery, KeywordGroup};
use tracing::debug;

/// Characters with operator meaning in the query grammar
const OPERATOR_CHARS: [char; 4] = ['(', ')', '&', '|'];

/// Translates keyword groups into one fully parenthesized boolean expression.
///
/// Groups render as `(a OR b)` and are joined left to right with `AND`.
/// Free-form extra terms form one more OR-group at the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the boolean query for the given groups and extra terms.
    ///
    /// Returns an empty expression (and an empty field map) when nothing
    /// renders, which callers treat as "no keyword constraint".
    pub fn build(&self, groups: &[KeywordGroup], extra_terms: &[String]) -> BooleanQuery {
        let mut rendered: Vec<String> = groups
            .iter()
            .filter_map(|group| render_group(&group.terms))
            .collect();

        if let Some(extra) = render_group(extra_terms) {
            rendered.push(extra);
        }

        let expression = rendered.join(" AND ");
        debug!(
            "Built query from {} groups and {} extra terms: {expression}",
            groups.len(),
            extra_terms.len()
        );
        BooleanQuery::applied_to_all_fields(expression)
    }
}

/// Renders one OR-group, or `None` when no term survives sanitization
fn render_group(terms: &[String]) -> Option<String> {
    let mut seen: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        if let Some(term) = sanitize_term(term) {
            if !seen.contains(&term) {
                seen.push(term);
            }
        }
    }

    if seen.is_empty() {
        None
    } else {
        Some(format!("({})", seen.join(" OR ")))
    }
}

/// Makes a single term safe to embed in the expression.
///
/// A term the user already wrapped in double quotes keeps its content
/// verbatim. Otherwise bare operator characters are dropped and whitespace
/// is collapsed. Anything still containing whitespace or a quote is quoted,
/// with internal quotes escaped.
pub fn sanitize_term(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    let content = match user_quoted(trimmed) {
        Some(inner) => inner.split_whitespace().collect::<Vec<_>>().join(" "),
        None => trimmed
            .chars()
            .filter(|c| !OPERATOR_CHARS.contains(c))
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    };

    if content.is_empty() || content.chars().all(|c| c == '"') {
        return None;
    }

    let needs_quotes = content.contains(' ')
        || content.contains('"')
        || content.contains(|c: char| OPERATOR_CHARS.contains(&c));
    if needs_quotes {
        Some(format!("\"{}\"", content.replace('"', "\\\"")))
    } else {
        Some(content)
    }
}

fn user_quoted(term: &str) -> Option<&str> {
    term.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|inner| !inner.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patentsearch_core::QueryField;
    use pretty_assertions::assert_eq;

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_plain_terms_are_kept() {
        assert_eq!(sanitize_term("probe").as_deref(), Some("probe"));
        assert_eq!(sanitize_term("  半導體 ").as_deref(), Some("半導體"));
    }

    #[test]
    fn test_whitespace_terms_are_quoted() {
        assert_eq!(
            sanitize_term("probe   card").as_deref(),
            Some("\"probe card\"")
        );
    }

    #[test]
    fn test_operators_are_stripped_outside_quotes() {
        assert_eq!(sanitize_term("(probe)").as_deref(), Some("probe"));
        assert_eq!(sanitize_term("a&b|c").as_deref(), Some("abc"));
        assert_eq!(sanitize_term("()|&"), None);
    }

    #[test]
    fn test_user_quoted_terms_keep_reserved_characters() {
        assert_eq!(
            sanitize_term("\"R&D (lab)\"").as_deref(),
            Some("\"R&D (lab)\"")
        );
    }

    #[test]
    fn test_internal_quotes_are_escaped() {
        assert_eq!(
            sanitize_term("12\" wafer").as_deref(),
            Some("\"12\\\" wafer\"")
        );
    }

    #[test]
    fn test_duplicate_terms_render_once() {
        let query = QueryBuilder::new().build(
            &[KeywordGroup::new(["probe", " probe ", "pin"])],
            &[],
        );
        assert_eq!(query.expression, "(probe OR pin)");
    }

    #[test]
    fn test_extra_terms_form_last_group() {
        let query = QueryBuilder::new().build(
            &[KeywordGroup::new(["wafer"])],
            &terms(&["automated", "robotic"]),
        );
        assert_eq!(query.expression, "(wafer) AND (automated OR robotic)");
    }

    #[test]
    fn test_empty_input_is_unconstrained() {
        let query = QueryBuilder::new().build(&[KeywordGroup::new(["", "  "])], &terms(&["()"]));
        assert!(query.is_unconstrained());
        assert!(query.fields.is_empty());
    }

    #[test]
    fn test_fields_carry_expression() {
        let query = QueryBuilder::new().build(&[KeywordGroup::new(["probe"])], &[]);
        for field in QueryField::ALL {
            assert_eq!(query.fields[&field], "(probe)");
        }
    }
}
