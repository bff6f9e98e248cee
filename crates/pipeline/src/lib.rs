//! End-to-end patent search pipeline
//!
//! [`SearchPipeline::run`] builds the boolean query, performs the search with
//! retry, normalizes the returned items and enriches them, returning the
//! records in service order together with [`RunMetadata`].
//!
//! [`RunMetadata`]: patentsearch_core::RunMetadata

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod pipeline;
mod types;

use patentsearch_core::config::Config;
use patentsearch_core::error::Result;
use patentsearch_enrichment::{create_annotator, EnrichmentScheduler};
use patentsearch_search_client::create_search_backend;

pub use pipeline::SearchPipeline;
pub use types::{SearchRequest, SearchResponse};

/// Create a pipeline from validated configuration
pub fn create_pipeline(config: &Config) -> Result<SearchPipeline> {
    config.validate()?;
    let backend = create_search_backend(&config.search)?;
    let annotator = create_annotator(&config.ai)?;
    let scheduler = EnrichmentScheduler::new(annotator, config.enrichment.clone())
        .with_multipliers(config.ai.transient_multiplier, config.ai.rate_limit_multiplier);
    Ok(SearchPipeline::new(
        backend,
        Some(scheduler),
        config.search.clone(),
        config.pipeline.clone(),
    ))
}
