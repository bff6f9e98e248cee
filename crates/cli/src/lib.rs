//! Argument helpers for the patentsearch binary

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{bail, Result};
use patentsearch_core::KeywordGroup;
use serde::Serialize;

/// Parses one `--group` argument: comma-separated terms, the first being the
/// primary keyword.
///
/// Both ASCII and full-width commas separate terms.
pub fn parse_keyword_group(raw: &str) -> Result<KeywordGroup> {
    let terms: Vec<&str> = raw
        .split([',', '，'])
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect();
    if terms.is_empty() {
        bail!("Keyword group '{raw}' contains no terms");
    }
    Ok(KeywordGroup::new(terms))
}

/// Result of a credential check, as printed by `verify`
#[derive(Debug, Serialize)]
pub struct VerifyOutcome {
    pub backend: String,
    pub valid: bool,
}

/// Serializes any output as pretty JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
