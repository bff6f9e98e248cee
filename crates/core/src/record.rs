//! Canonical patent record produced by the normalizer

use serde::{Deserialize, Serialize};

/// Placeholder for any text field that could not be extracted
pub const PLACEHOLDER: &str = "N/A";

/// Country code used when neither the database nor the applicants resolve one
pub const DEFAULT_COUNTRY: &str = "TW";

/// Separator used when joining applicant or inventor names
pub const NAME_SEPARATOR: &str = "; ";

const DETAIL_URL_PREFIX: &str = "https://tiponet.tipo.gov.tw/gpss4/gpsskmc/gpssbkm?!!FRURL";

/// Normalized, placeholder-complete representation of one retrieved item.
///
/// Text fields hold [`PLACEHOLDER`] when nothing could be extracted and list
/// fields are empty; no field is ever absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalPatentRecord {
    pub title: String,
    pub applicants: Vec<String>,
    pub inventors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Excerpt of the first claims, numbered
    pub claims: String,
    pub publication_number: String,
    pub application_number: String,
    pub application_date: String,
    pub publication_date: String,
    pub priority_date: String,
    pub ipc_codes: Vec<String>,
    pub database: String,
    pub country: String,
    pub case_type: String,
}

impl CanonicalPatentRecord {
    /// A record with the given title and every other field at its placeholder
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            applicants: Vec::new(),
            inventors: Vec::new(),
            abstract_text: PLACEHOLDER.to_string(),
            claims: PLACEHOLDER.to_string(),
            publication_number: PLACEHOLDER.to_string(),
            application_number: PLACEHOLDER.to_string(),
            application_date: PLACEHOLDER.to_string(),
            publication_date: PLACEHOLDER.to_string(),
            priority_date: PLACEHOLDER.to_string(),
            ipc_codes: Vec::new(),
            database: PLACEHOLDER.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            case_type: PLACEHOLDER.to_string(),
        }
    }

    /// Applicant names joined with `"; "`, or the placeholder
    pub fn applicants_display(&self) -> String {
        join_names(&self.applicants)
    }

    /// Inventor names joined with `"; "`, or the placeholder
    pub fn inventors_display(&self) -> String {
        join_names(&self.inventors)
    }

    /// IPC codes joined with `"; "`, or the placeholder
    pub fn ipc_display(&self) -> String {
        join_names(&self.ipc_codes)
    }

    /// Public detail page for this record, when the publication number is known
    pub fn detail_url(&self) -> Option<String> {
        if is_placeholder(&self.publication_number) {
            return None;
        }
        Some(format!("{DETAIL_URL_PREFIX}{}", self.publication_number))
    }
}

/// Whether a text field holds no real value
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == PLACEHOLDER
}

fn join_names(names: &[String]) -> String {
    if names.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        names.join(NAME_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_record() {
        let record = CanonicalPatentRecord::with_title("Probe card");
        assert_eq!(record.applicants_display(), PLACEHOLDER);
        assert_eq!(record.country, DEFAULT_COUNTRY);
        assert_eq!(record.detail_url(), None);
    }

    #[test]
    fn test_detail_url_uses_publication_number() {
        let mut record = CanonicalPatentRecord::with_title("Probe card");
        record.publication_number = "I123456".to_string();
        assert_eq!(
            record.detail_url().as_deref(),
            Some("https://tiponet.tipo.gov.tw/gpss4/gpsskmc/gpssbkm?!!FRURLI123456")
        );
    }

    #[test]
    fn test_joined_names() {
        let mut record = CanonicalPatentRecord::with_title("x");
        record.applicants = vec!["Acme".to_string(), "Globex".to_string()];
        assert_eq!(record.applicants_display(), "Acme; Globex");
    }
}
