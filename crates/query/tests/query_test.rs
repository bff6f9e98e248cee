use patentsearch_core::{KeywordGroup, KeywordOrigin, QueryField};
use patentsearch_query::QueryBuilder;
use pretty_assertions::assert_eq;

/// Splits an expression on top-level ` AND `, ignoring quoted text and nesting
fn top_level_groups(expression: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if escaped {
            escaped = false;
        } else if c == '\\' && in_quotes {
            escaped = true;
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes && c == '(' {
            depth += 1;
        } else if !in_quotes && c == ')' {
            depth -= 1;
        } else if !in_quotes && depth == 0 && chars[i..].starts_with(&[' ', 'A', 'N', 'D', ' ']) {
            groups.push(std::mem::take(&mut current));
            i += 5;
            continue;
        }
        current.push(c);
        i += 1;
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

#[test]
fn test_concrete_scenario() {
    let groups = vec![
        KeywordGroup::new(["semiconductor", "chip"]),
        KeywordGroup::new(["probe"]),
    ];
    let query = QueryBuilder::new().build(&groups, &["automated".to_string()]);

    assert_eq!(
        query.expression,
        "(semiconductor OR chip) AND (probe) AND (automated)"
    );
    assert_eq!(query.fields.len(), 3);
    assert_eq!(
        query.fields[&QueryField::Title],
        "(semiconductor OR chip) AND (probe) AND (automated)"
    );
}

#[test]
fn test_one_top_level_group_per_non_empty_input_group() {
    let groups = vec![
        KeywordGroup::new(["probe card", "(contact)", "R&D"]),
        KeywordGroup::new(["", "   "]),
        KeywordGroup::with_synonyms("測試", vec!["檢測".to_string(), "test \"pin\"".to_string()]),
        KeywordGroup::new(["AND", "OR"]).origin(KeywordOrigin::Suggested),
        KeywordGroup::new(["x|y"]),
    ];
    let query = QueryBuilder::new().build(&groups, &[]);
    let rendered = top_level_groups(&query.expression);

    let non_empty = groups.iter().filter(|g| g.has_terms()).count();
    assert_eq!(rendered.len(), non_empty);
    for group in &rendered {
        assert!(group.starts_with('(') && group.ends_with(')'), "{group}");
    }
    // input order is preserved
    assert!(rendered[0].contains("probe card"));
    assert!(rendered[1].contains("測試"));
    assert!(rendered[3].contains("xy"));
}

#[test]
fn test_rendering_is_deterministic() {
    let groups = vec![
        KeywordGroup::new(["wafer", "die"]),
        KeywordGroup::new(["probe station"]),
    ];
    let extra = vec!["vacuum".to_string()];
    let builder = QueryBuilder::new();

    let first = builder.build(&groups, &extra);
    let second = builder.build(&groups, &extra);
    assert_eq!(first, second);
}

#[test]
fn test_only_extra_terms() {
    let query = QueryBuilder::new().build(&[], &["laser".to_string(), "optical fiber".to_string()]);
    assert_eq!(query.expression, "(laser OR \"optical fiber\")");
}
