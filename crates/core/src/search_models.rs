//! Query-side models shared by the query builder, the search client and the pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a keyword group came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordOrigin {
    /// Typed by the user
    #[default]
    User,
    /// Suggested by the AI service
    Suggested,
    /// Synonym expansion of another term
    Synonym,
}

/// A primary term plus zero or more synonyms, combined with OR.
///
/// Groups are combined with AND. A group without any non-empty term
/// contributes nothing to the rendered expression.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeywordGroup {
    /// Ordered terms; the first one is the primary keyword
    pub terms: Vec<String>,
    #[serde(default)]
    pub origin: KeywordOrigin,
}

impl KeywordGroup {
    /// Creates a group from any list of terms
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            origin: KeywordOrigin::User,
        }
    }

    /// Creates a group from a primary keyword and its synonyms
    pub fn with_synonyms<S: Into<String>>(keyword: S, synonyms: Vec<String>) -> Self {
        let mut terms = Vec::with_capacity(synonyms.len() + 1);
        terms.push(keyword.into());
        terms.extend(synonyms);
        Self {
            terms,
            origin: KeywordOrigin::Synonym,
        }
    }

    /// Marks the group with the given origin
    pub fn origin(mut self, origin: KeywordOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// The first non-empty term
    pub fn primary(&self) -> Option<&str> {
        self.terms
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
    }

    /// Whether at least one term is non-empty after trimming
    pub fn has_terms(&self) -> bool {
        self.primary().is_some()
    }
}

/// Search-service field a boolean expression is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryField {
    Title,
    Abstract,
    Claims,
}

impl QueryField {
    /// All fields the expression is applied to, in parameter order
    pub const ALL: [QueryField; 3] = [QueryField::Title, QueryField::Abstract, QueryField::Claims];

    /// Query-string parameter name understood by the search service.
    ///
    /// The `+` prefix ORs the field with the preceding title condition.
    pub fn param_name(self) -> &'static str {
        match self {
            QueryField::Title => "TI",
            QueryField::Abstract => "+AB",
            QueryField::Claims => "+CL",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryField::Title => "title",
            QueryField::Abstract => "abstract",
            QueryField::Claims => "claims",
        };
        f.write_str(name)
    }
}

/// A rendered boolean expression plus the per-field fragments sent to the service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BooleanQuery {
    pub expression: String,
    pub fields: BTreeMap<QueryField, String>,
}

impl BooleanQuery {
    /// Applies one expression to every searchable field.
    ///
    /// An empty expression yields an empty field map ("no keyword constraint").
    pub fn applied_to_all_fields(expression: String) -> Self {
        let fields = if expression.is_empty() {
            BTreeMap::new()
        } else {
            QueryField::ALL
                .iter()
                .map(|field| (*field, expression.clone()))
                .collect()
        };
        Self { expression, fields }
    }

    /// True when the query carries no keyword constraint
    pub fn is_unconstrained(&self) -> bool {
        self.expression.is_empty()
    }
}

/// Inclusive date range sent as `YYYYMMDD:YYYYMMDD`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    /// The range ending today and spanning the given number of years back
    pub fn last_years(years: u32) -> Self {
        let end = chrono::Local::now().date_naive();
        let start = end - chrono::Duration::days(365 * i64::from(years));
        Self { start, end }
    }

    /// Wire format understood by the search service
    pub fn to_param(&self) -> String {
        format!(
            "{}:{}",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

/// Per-request search parameters besides the boolean expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results requested from the service
    pub max_results: usize,
    /// Database codes to search (e.g. `TWA`, `USB`)
    pub databases: Vec<String>,
    /// Case types (`A` published, `B` granted)
    pub case_types: String,
    /// Patent types (`I` invention, `M` utility model)
    pub patent_types: String,
    /// Comma-separated output field codes
    pub output_fields: String,
    /// Issue-date range; `None` means no date constraint
    pub date_range: Option<DateRange>,
    /// Pass-through parameters appended verbatim
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_group_without_terms() {
        let group = KeywordGroup::new(["", "   "]);
        assert!(!group.has_terms());
        assert_eq!(group.primary(), None);
    }

    #[test]
    fn test_empty_expression_has_no_fields() {
        let query = BooleanQuery::applied_to_all_fields(String::new());
        assert!(query.is_unconstrained());
        assert!(query.fields.is_empty());
    }

    #[test]
    fn test_expression_applied_to_every_field() {
        let query = BooleanQuery::applied_to_all_fields("(probe)".to_string());
        assert_eq!(query.fields.len(), 3);
        assert_eq!(query.fields[&QueryField::Claims], "(probe)");
        assert_eq!(QueryField::Abstract.param_name(), "+AB");
    }

    #[test]
    fn test_date_range_param() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2015, 1, 2).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        assert_eq!(range.to_param(), "20150102:20250101");
    }
}
