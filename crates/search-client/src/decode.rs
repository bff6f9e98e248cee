//! Three-tier decoding of search service responses
//!
//! 1. strict parse
//! 2. regex repairs, then parse
//! 3. segment salvage anchored at the envelope key

use crate::repair::{array_objects, repair_json};
use patentsearch_core::error::{Error, Result};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Top-level key every search response is wrapped in
pub const ENVELOPE_KEY: &str = "gpss-API";

const ITEMS_KEY: &str = "\"patentcontent\"";

/// Which decoding tier produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeTier {
    Strict,
    Repaired,
    Salvaged { recovered: usize, discarded: usize },
}

/// Decoded, still untyped search service payload
#[derive(Debug, Clone, PartialEq)]
pub struct RawSearchResponse {
    pub payload: Value,
    pub tier: DecodeTier,
}

impl RawSearchResponse {
    /// Whether any repair was needed to read the payload
    pub fn was_repaired(&self) -> bool {
        self.tier != DecodeTier::Strict
    }
}

/// Decodes a response body.
///
/// Fails with [`Error::Protocol`] when the body parses but lacks the envelope
/// key, and with [`Error::Decode`] when nothing can be recovered because the
/// envelope anchor does not even occur in the text.
pub fn decode_body(body: &str) -> Result<RawSearchResponse> {
    let strict_err = match serde_json::from_str::<Value>(body) {
        Ok(payload) => return with_envelope(payload, DecodeTier::Strict),
        Err(e) => e,
    };
    warn!("Direct JSON parse failed, attempting repair: {strict_err}");

    let repaired_err = match serde_json::from_str::<Value>(&repair_json(body)) {
        Ok(payload) => {
            debug!("Response decoded after regex repair");
            return with_envelope(payload, DecodeTier::Repaired);
        }
        Err(e) => e,
    };
    warn!("Repaired JSON parse failed, attempting segment salvage: {repaired_err}");

    salvage(body).ok_or_else(|| {
        Error::decode(format!(
            "Unrecoverable response (strict: {strict_err}; repaired: {repaired_err})"
        ))
    })
}

fn with_envelope(payload: Value, tier: DecodeTier) -> Result<RawSearchResponse> {
    if payload.get(ENVELOPE_KEY).is_none() {
        return Err(Error::protocol(format!(
            "Response is missing the '{ENVELOPE_KEY}' envelope"
        )));
    }
    Ok(RawSearchResponse { payload, tier })
}

/// Recovers the intact items of a corrupted body, or `None` without an envelope anchor
fn salvage(body: &str) -> Option<RawSearchResponse> {
    let anchor = format!("\"{ENVELOPE_KEY}\"");
    let envelope_at = body.find(&anchor)?;

    let mut items = Vec::new();
    let mut discarded = 0;

    if let Some(array_at) = items_array_start(body, envelope_at) {
        for object in array_objects(body, array_at) {
            match serde_json::from_str::<Value>(object)
                .or_else(|_| serde_json::from_str::<Value>(&repair_json(object)))
            {
                Ok(item) if item.is_object() => items.push(item),
                _ => discarded += 1,
            }
        }
    }

    let recovered = items.len();
    if discarded > 0 {
        warn!("Salvage discarded {discarded} unreadable items");
    }
    warn!("Salvaged {recovered} items from a malformed response");

    let mut patent = Map::new();
    patent.insert("patentcontent".to_string(), Value::Array(items));
    Some(RawSearchResponse {
        payload: json!({ ENVELOPE_KEY: { "patent": Value::Object(patent) } }),
        tier: DecodeTier::Salvaged {
            recovered,
            discarded,
        },
    })
}

/// Offset of the `[` opening the item array after the envelope anchor
fn items_array_start(body: &str, from: usize) -> Option<usize> {
    let key_at = from + body.get(from..)?.find(ITEMS_KEY)?;
    let after_key = key_at + ITEMS_KEY.len();
    let rest = body.get(after_key..)?;
    let colon = rest.find(':')?;
    let after_colon = rest.get(colon + 1..)?;
    let trimmed = after_colon.trim_start();
    if !trimmed.starts_with('[') {
        return None;
    }
    Some(after_key + colon + 1 + (after_colon.len() - trimmed.len()))
}
