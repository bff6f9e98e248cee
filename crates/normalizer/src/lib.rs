//! Normalization of search service items into canonical patent records
//!
//! Items arrive with inconsistent nesting: lists that are sometimes single
//! objects, localized and alternate-language name fields, paragraphs given as
//! lists or plain strings. Every field is read independently and falls back
//! to its placeholder; only a missing title drops the item.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod country;
mod envelope;
mod extract;
mod node;

pub use country::country_from_database;
pub use envelope::{extract_items, normalize_payload, NormalizedBatch, ENVELOPE_KEY};
pub use extract::{normalize, normalize_item, MAX_CLAIMS};
