//! Core types and traits for the patentsearch pipeline
//!
//! This crate provides the foundational abstractions used throughout the
//! patentsearch system, including:
//!
//! - **Query models**: keyword groups, boolean queries and search parameters
//! - **Records**: the canonical patent record and its enrichment
//! - **Retry**: the backoff policy shared by every external call
//! - **Configuration**: System configuration management
//! - **Error handling**: Unified error types
//!

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod enrichment;
pub mod error;
pub mod record;
pub mod retry;
pub mod search_models;

// Re-export main types for convenience
pub use config::{AiConfig, Config, EnrichmentConfig, PipelineConfig, SearchConfig};
pub use enrichment::{
    BatchState, EnrichedPatentRecord, EnrichmentResult, EnrichmentSource, RunMetadata,
};
pub use error::{Error, Result, ResultExt};
pub use record::CanonicalPatentRecord;
pub use retry::{retry, BackoffPolicy};
pub use search_models::{
    BooleanQuery, DateRange, KeywordGroup, KeywordOrigin, QueryField, SearchParams,
};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
    pub use crate::record::CanonicalPatentRecord;
}
