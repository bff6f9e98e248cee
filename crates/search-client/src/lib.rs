//! Client side of the patent search service
//!
//! Builds request URLs, issues one request per call and decodes the body
//! through a strict / repaired / salvaged ladder. Retrying belongs to the
//! caller (see [`patentsearch_core::retry`]).

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use patentsearch_core::config::SearchConfig;
use patentsearch_core::error::{Error, Result};
use std::sync::Arc;
use tracing::info;

mod backend;
mod decode;
mod gpss;
mod mock;
mod repair;
mod stats;

pub use backend::SearchBackend;
pub use decode::{decode_body, DecodeTier, RawSearchResponse, ENVELOPE_KEY};
pub use gpss::{build_request_url, GpssSearchClient};
pub use mock::MockSearchBackend;
pub use repair::repair_json;
pub use stats::SearchStats;

/// Create the search backend named by `search.provider`
pub fn create_search_backend(config: &SearchConfig) -> Result<Arc<dyn SearchBackend>> {
    match config.provider.as_str() {
        "gpss" => Ok(Arc::new(GpssSearchClient::new(config)?)),
        "mock" => {
            info!("Using mock search backend");
            Ok(Arc::new(MockSearchBackend::new()))
        }
        other => Err(Error::config(format!("Unknown search provider '{other}'"))),
    }
}
