//! Item extraction from the search response envelope

use crate::extract::normalize;
use patentsearch_core::error::{Error, Result};
use patentsearch_core::record::CanonicalPatentRecord;
use serde_json::Value;
use tracing::{info, warn};

/// Top-level key of every search response
pub const ENVELOPE_KEY: &str = "gpss-API";

/// Records normalized from one response plus the items that had to be dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub records: Vec<CanonicalPatentRecord>,
    pub dropped: usize,
}

/// Raw items of a decoded response, in service order.
///
/// A single item object is accepted in place of the item list.
///
/// # Errors
/// - `Error::Protocol` when the envelope key is absent
/// - `Error::Service` when the envelope carries an error block
pub fn extract_items(payload: &Value) -> Result<Vec<&Value>> {
    let envelope = payload
        .get(ENVELOPE_KEY)
        .ok_or_else(|| Error::protocol(format!("Response is missing the '{ENVELOPE_KEY}' envelope")))?;

    if let Some(error) = envelope.get("error") {
        let message = error
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(Error::service(message));
    }

    let items = match envelope.pointer("/patent/patentcontent") {
        None | Some(Value::Null) => {
            warn!("Search response carries no patent content");
            Vec::new()
        }
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) => vec![item],
    };
    Ok(items)
}

/// Normalizes every item of a decoded response
pub fn normalize_payload(payload: &Value) -> Result<NormalizedBatch> {
    let items = extract_items(payload)?;
    let total = items.len();

    let records: Vec<CanonicalPatentRecord> = items.into_iter().filter_map(normalize).collect();
    let dropped = total - records.len();

    if dropped > 0 {
        warn!("Dropped {dropped} of {total} items without a usable title");
    }
    info!("Normalized {} records", records.len());

    Ok(NormalizedBatch { records, dropped })
}
