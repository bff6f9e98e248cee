//! Country resolution for normalized records
//!
//! The source database code is trusted over applicant nationality: markers in
//! the database code win, then the first applicant's explicit country code,
//! then [`DEFAULT_COUNTRY`].

use crate::node::Node;
use patentsearch_core::record::DEFAULT_COUNTRY;

/// Database code markers, checked in order against the upper-cased code
const DATABASE_MARKERS: &[(&[&str], &str)] = &[
    (&["TW", "本國", "中華民國"], "TW"),
    (&["US", "美國"], "US"),
    (&["JP", "日本"], "JP"),
    (&["EP", "歐洲"], "EP"),
    (&["KP", "KR", "韓國"], "KR"),
    (&["CN", "中國"], "CN"),
    (&["WO", "PCT"], "WO"),
    (&["SEA", "東南亞"], "SEA"),
    (&["OT", "其他"], "OTHER"),
];

/// Country implied by a database code, if any marker matches
pub fn country_from_database(database: &str) -> Option<&'static str> {
    let upper = database.to_uppercase();
    DATABASE_MARKERS
        .iter()
        .find(|(markers, _)| markers.iter().any(|marker| upper.contains(marker)))
        .map(|(_, country)| *country)
}

pub(crate) fn resolve_country(database: Option<&str>, item: Node<'_>) -> String {
    let Some(database) = database.filter(|db| !db.trim().is_empty()) else {
        return DEFAULT_COUNTRY.to_string();
    };
    if let Some(country) = country_from_database(database) {
        return country.to_string();
    }
    first_applicant_country(item).unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
}

fn first_applicant_country(item: Node<'_>) -> Option<String> {
    let first = item
        .at(&["parties", "applicants", "applicant"])
        .one_or_many()
        .into_iter()
        .next()?;
    first
        .get("country-code")
        .text()
        .or_else(|| first.at(&["address", "country-code"]).text())
        .map(|code| code.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_markers() {
        assert_eq!(country_from_database("TWB"), Some("TW"));
        assert_eq!(country_from_database("usa"), Some("US"));
        assert_eq!(country_from_database("KPA"), Some("KR"));
        assert_eq!(country_from_database("中國專利"), Some("CN"));
        assert_eq!(country_from_database("PCT"), Some("WO"));
        assert_eq!(country_from_database("SEA"), Some("SEA"));
        assert_eq!(country_from_database("XYZ"), None);
    }

    #[test]
    fn test_database_beats_applicant_nationality() {
        let item = json!({"parties": {"applicants": {"applicant": {"country-code": "jp"}}}});
        assert_eq!(resolve_country(Some("USB"), Node::new(&item)), "US");
    }

    #[test]
    fn test_falls_back_to_first_applicant() {
        let item = json!({"parties": {"applicants": {"applicant": [
            {"name": "A", "address": {"country-code": "de"}},
            {"name": "B", "country-code": "FR"}
        ]}}});
        assert_eq!(resolve_country(Some("XYZ"), Node::new(&item)), "DE");
    }

    #[test]
    fn test_default_country() {
        let item = json!({});
        assert_eq!(resolve_country(Some("XYZ"), Node::new(&item)), "TW");
        assert_eq!(resolve_country(None, Node::new(&item)), "TW");
    }
}
