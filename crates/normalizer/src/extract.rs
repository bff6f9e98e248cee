//! Field extraction for single search items
//!
//! Each extractor reads one field and returns its own `Result`; a failing
//! extractor only costs its field, which falls back to its placeholder. The
//! title is the exception: without one the item is dropped.

use crate::country::resolve_country;
use crate::node::Node;
use patentsearch_core::error::{Error, Result};
use patentsearch_core::record::{is_placeholder, CanonicalPatentRecord, PLACEHOLDER};
use serde_json::Value;
use tracing::debug;

/// Claims kept in the excerpt
pub const MAX_CLAIMS: usize = 3;

const TITLE_KEYS: &[&str] = &["title", "chinese-title", "english-title"];
const APPLICANT_NAME_KEYS: &[&str] = &["name", "chinese-name", "english-name", "party-name"];
const INVENTOR_NAME_KEYS: &[&str] = &["name", "chinese-name", "english-name"];
const IPC_KEYS: &[&str] = &["keyValue", "classification-symbol"];

/// Maps one raw item to a canonical record.
///
/// # Errors
/// `Error::Validation` when the item has no usable title.
pub fn normalize_item(item: &Value) -> Result<CanonicalPatentRecord> {
    let item = Node::new(item);
    let title = title(item)?;
    let database = database(item);

    Ok(CanonicalPatentRecord {
        title,
        applicants: or_empty("applicants", applicants(item)),
        inventors: or_empty("inventors", inventors(item)),
        abstract_text: or_placeholder("abstract", abstract_text(item)),
        claims: or_placeholder("claims", claims(item)),
        publication_number: or_placeholder(
            "publication number",
            text_at(item, &["publication-reference", "doc-number"]),
        ),
        application_number: or_placeholder(
            "application number",
            text_at(item, &["application-reference", "doc-number"]),
        ),
        application_date: or_placeholder(
            "application date",
            text_at(item, &["application-reference", "date"]),
        ),
        publication_date: or_placeholder(
            "publication date",
            text_at(item, &["publication-reference", "date"]),
        ),
        priority_date: or_placeholder("priority date", priority_date(item)),
        ipc_codes: or_empty("IPC codes", ipc_codes(item)),
        country: resolve_country(database.as_ref().ok().map(String::as_str), item),
        database: or_placeholder("database", database),
        case_type: or_placeholder("case type", case_type(item)),
    })
}

/// Maps one raw item to a canonical record, `None` when it has no usable title
pub fn normalize(item: &Value) -> Option<CanonicalPatentRecord> {
    match normalize_item(item) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!("Dropping item: {e}");
            None
        }
    }
}

fn or_placeholder(field: &str, result: Result<String>) -> String {
    result.unwrap_or_else(|e| {
        debug!("Field '{field}' unavailable: {e}");
        PLACEHOLDER.to_string()
    })
}

fn or_empty(field: &str, result: Result<Vec<String>>) -> Vec<String> {
    result.unwrap_or_else(|e| {
        debug!("Field '{field}' unavailable: {e}");
        Vec::new()
    })
}

fn missing(field: &str) -> Error {
    Error::validation(format!("no {field}"))
}

fn unexpected(field: &str) -> Error {
    Error::validation(format!("unexpected shape for {field}"))
}

fn title(item: Node<'_>) -> Result<String> {
    let raw = item.get("patent-title");
    let title = match raw {
        Node::Object(_) => raw.first_text(TITLE_KEYS),
        other => other.text(),
    };
    title
        .filter(|title| !is_placeholder(title))
        .ok_or_else(|| missing("usable title"))
}

/// Name of a party entry: the first name key of an object, or a plain string
fn party_name(party: Node<'_>, keys: &[&str]) -> Option<String> {
    match party {
        Node::Object(_) => party.first_text(keys),
        other => other.text(),
    }
}

fn party_names(item: Node<'_>, path: &[&str], keys: &[&str]) -> Vec<String> {
    item.at(path)
        .one_or_many()
        .into_iter()
        .filter_map(|party| party_name(party, keys))
        .collect()
}

fn applicants(item: Node<'_>) -> Result<Vec<String>> {
    let mut names = party_names(
        item,
        &["parties", "applicants", "applicant"],
        APPLICANT_NAME_KEYS,
    );
    if names.is_empty() {
        names = party_names(item, &["applicants"], APPLICANT_NAME_KEYS);
    }
    if names.is_empty() {
        return Err(missing("applicants"));
    }
    Ok(names)
}

fn inventors(item: Node<'_>) -> Result<Vec<String>> {
    let names = party_names(
        item,
        &["parties", "inventors", "inventor"],
        INVENTOR_NAME_KEYS,
    );
    if names.is_empty() {
        return Err(missing("inventors"));
    }
    Ok(names)
}

fn abstract_text(item: Node<'_>) -> Result<String> {
    let node = item.get("abstract");
    let text = match node {
        Node::Object(_) => {
            let paragraphs = node.get("p");
            if paragraphs.is_missing() {
                node.get("content").flat_text()
            } else {
                paragraphs.flat_text()
            }
        }
        Node::Text(_) => node.text(),
        Node::Missing => None,
        _ => return Err(unexpected("abstract")),
    };
    text.ok_or_else(|| missing("abstract"))
}

fn claims(item: Node<'_>) -> Result<String> {
    let node = item.get("claims");
    let excerpt = match node {
        Node::Object(_) => {
            let numbered: Vec<String> = node
                .get("claim")
                .one_or_many()
                .into_iter()
                .take(MAX_CLAIMS)
                .enumerate()
                .filter_map(|(index, claim)| {
                    let text = match claim {
                        Node::Object(_) => claim.get("claim-text").flat_text(),
                        other => other.text(),
                    }?;
                    Some(format!("{}. {text}", index + 1))
                })
                .collect();
            (!numbered.is_empty()).then(|| numbered.join(" "))
        }
        Node::Missing => None,
        Node::Text(_) => node.text(),
        _ => return Err(unexpected("claims")),
    };
    excerpt.ok_or_else(|| missing("claims"))
}

fn text_at(item: Node<'_>, path: &[&str]) -> Result<String> {
    item.at(path).text().ok_or_else(|| missing(&path.join(".")))
}

fn priority_date(item: Node<'_>) -> Result<String> {
    let claims = item.get("priority-claims");
    claims
        .get("date")
        .text()
        .or_else(|| {
            claims
                .get("priority-claim")
                .one_or_many()
                .into_iter()
                .find_map(|claim| claim.get("date").text())
        })
        .ok_or_else(|| missing("priority date"))
}

fn ipc_codes(item: Node<'_>) -> Result<Vec<String>> {
    let block = item.get("classifications-ipc");
    match block {
        Node::Object(_) => {}
        Node::Missing => return Err(missing("classifications")),
        _ => return Err(unexpected("classifications")),
    }
    let codes: Vec<String> = block
        .get("ipc")
        .one_or_many()
        .into_iter()
        .filter_map(|ipc| match ipc {
            Node::Object(_) => ipc.first_text(IPC_KEYS),
            other => other.text(),
        })
        .collect();
    if codes.is_empty() {
        return Err(missing("IPC codes"));
    }
    Ok(codes)
}

fn database(item: Node<'_>) -> Result<String> {
    item.get("@database").text().ok_or_else(|| missing("database"))
}

/// `@status` carries the case type (A published, B granted); older payloads use `@type`
fn case_type(item: Node<'_>) -> Result<String> {
    item.first_text(&["@status", "@type"])
        .ok_or_else(|| missing("case type"))
}
