//! AI enrichment of canonical patent records
//!
//! - [`ResilientAiClient`] annotates one record through the AI service with
//!   retry, backoff and reply repair
//! - [`OfflineAnnotator`] produces the deterministic keyword-table annotations
//! - [`EnrichmentScheduler`] runs an annotator over many records in bounded
//!   parallel batches, degrading failures instead of propagating them
//! - [`KeywordSuggester`] proposes keyword groups from a description

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use patentsearch_core::config::AiConfig;
use patentsearch_core::error::{Error, Result};
use std::sync::Arc;

mod annotator;
mod chat;
mod client;
mod fallback;
mod keywords;
mod prompts;
mod response;
mod scheduler;
mod stats;
mod text;

pub use annotator::Annotator;
pub use chat::ChatClient;
pub use client::ResilientAiClient;
pub use fallback::{fallback_annotation, OfflineAnnotator};
pub use keywords::{
    fallback_suggestions, validate_suggestions, KeywordSuggester, KeywordSuggestion,
    SuggestionSource,
};
pub use response::{parse_reply, post_process, AnnotationKind};
pub use scheduler::{inter_batch_delay, EnrichmentRun, EnrichmentScheduler};
pub use stats::AiStats;
pub use text::{clean_text, truncate_description, PatentText};

/// Create the annotator named by `ai.provider`
pub fn create_annotator(config: &AiConfig) -> Result<Arc<dyn Annotator>> {
    match config.provider.as_str() {
        "openai" => {
            let chat = Arc::new(ChatClient::new(config)?);
            Ok(Arc::new(ResilientAiClient::new(chat, config)))
        }
        "offline" => Ok(Arc::new(OfflineAnnotator)),
        other => Err(Error::config(format!("Unknown AI provider '{other}'"))),
    }
}

/// Create a keyword suggester for `ai.provider`
pub fn create_keyword_suggester(config: &AiConfig) -> Result<KeywordSuggester> {
    match config.provider.as_str() {
        "openai" => Ok(KeywordSuggester::new(
            Arc::new(ChatClient::new(config)?),
            config,
        )),
        "offline" => Ok(KeywordSuggester::offline()),
        other => Err(Error::config(format!("Unknown AI provider '{other}'"))),
    }
}
