//! Configuration module for the patentsearch system
//!
//! This module provides configuration structures and loading mechanisms for the
//! search and enrichment pipeline. Configuration can be loaded from TOML files
//! and/or environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use crate::retry::BackoffPolicy;
use crate::search_models::{DateRange, SearchParams};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub use defaults::MAX_RESULTS_CAP;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.patentsearch/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".patentsearch").join("config.toml"))
}

/// Main configuration structure for the patentsearch system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search service configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// AI annotation service configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Enrichment scheduler configuration
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Configuration for the external patent search service
///
/// # Providers
/// - `gpss` (default): the public GPSS search API, uses GPSS_API_KEY env var
/// - `mock`: fixed sample records, never touches the network
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider type: "gpss" (default), "mock"
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// Endpoint of the search API
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// User credential (or use GPSS_API_KEY env var)
    pub api_key: Option<String>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Connect timeout in seconds
    #[serde(default = "default_search_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,

    /// Idle pooled connections kept per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Default number of results per request (capped at 1000)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Database codes to search
    #[serde(default = "default_databases")]
    pub databases: Vec<String>,

    /// Case types: `A` published applications, `B` granted patents
    #[serde(default = "default_case_types")]
    pub case_types: String,

    /// Patent types: `I` invention, `M` utility model
    #[serde(default = "default_patent_types")]
    pub patent_types: String,

    /// Comma-separated output field codes
    #[serde(default = "default_output_fields")]
    pub output_fields: String,

    /// Years back from today covered by the issue-date filter (0 disables it)
    #[serde(default = "default_date_range_years")]
    pub date_range_years: u32,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("max_results", &self.max_results)
            .field("databases", &self.databases)
            .field("case_types", &self.case_types)
            .field("patent_types", &self.patent_types)
            .field("output_fields", &self.output_fields)
            .field("date_range_years", &self.date_range_years)
            .finish()
    }
}

impl SearchConfig {
    /// Request parameters for a search returning up to `max_results` items
    pub fn search_params(&self, max_results: Option<usize>) -> SearchParams {
        let max_results = max_results
            .unwrap_or(self.max_results)
            .clamp(1, MAX_RESULTS_CAP);
        let date_range =
            (self.date_range_years > 0).then(|| DateRange::last_years(self.date_range_years));
        SearchParams {
            max_results,
            databases: self.databases.clone(),
            case_types: self.case_types.clone(),
            patent_types: self.patent_types.clone(),
            output_fields: self.output_fields.clone(),
            date_range,
            extra: BTreeMap::new(),
        }
    }
}

/// Configuration for the AI annotation service
///
/// # Providers
/// - `openai` (default): any chat-completions compatible endpoint (vLLM, Qwen)
/// - `offline`: deterministic keyword-table annotations only
#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider type: "openai" (default), "offline"
    #[serde(default = "default_ai_provider")]
    pub provider: String,

    /// API base URL; `/v1/chat/completions` is appended (or use QWEN_API_URL)
    #[serde(default = "default_ai_api_base_url")]
    pub api_base_url: String,

    /// Model name (or use QWEN_MODEL)
    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Optional bearer token
    pub api_key: Option<String>,

    /// Connect timeout in seconds
    #[serde(default = "default_ai_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request, including the first one
    #[serde(default = "default_ai_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_ai_base_retry_delay_ms")]
    pub base_retry_delay_ms: u64,

    /// Backoff growth factor after a 429 response
    #[serde(default = "default_rate_limit_multiplier")]
    pub rate_limit_multiplier: f64,

    /// Backoff growth factor after other transient failures
    #[serde(default = "default_transient_multiplier")]
    pub transient_multiplier: f64,

    /// Upper bound for a single retry delay in milliseconds
    #[serde(default = "default_ai_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token cap for feature/effect annotation
    #[serde(default = "default_max_tokens_features")]
    pub max_tokens_features: u32,

    /// Token cap for keyword suggestion
    #[serde(default = "default_max_tokens_keywords")]
    pub max_tokens_keywords: u32,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("base_retry_delay_ms", &self.base_retry_delay_ms)
            .field("rate_limit_multiplier", &self.rate_limit_multiplier)
            .field("transient_multiplier", &self.transient_multiplier)
            .field("max_retry_delay_ms", &self.max_retry_delay_ms)
            .field("temperature", &self.temperature)
            .field("max_tokens_features", &self.max_tokens_features)
            .field("max_tokens_keywords", &self.max_tokens_keywords)
            .finish()
    }
}

impl AiConfig {
    /// Backoff policy for calls to the AI service
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.base_retry_delay_ms),
            Duration::from_millis(self.max_retry_delay_ms),
            self.max_retries,
        )
        .with_multipliers(self.transient_multiplier, self.rate_limit_multiplier)
    }
}

/// Record count threshold and the batch size used up to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSizeTier {
    pub max_records: usize,
    pub batch_size: usize,
}

/// Configuration for the enrichment scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Maximum simultaneous AI calls
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Attempts per record, including the first one
    #[serde(default = "default_enrichment_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first per-record retry in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound for a per-record retry delay in milliseconds
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Base delay between batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Cap of the failure-driven inter-batch delay, as a multiple of the base
    #[serde(default = "default_max_delay_multiplier")]
    pub max_delay_multiplier: f64,

    /// Timeout of a single annotation attempt in seconds
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Batch size by total record count, in ascending threshold order
    #[serde(default = "default_batch_size_tiers")]
    pub batch_size_tiers: Vec<BatchSizeTier>,

    /// Batch size for record counts above every tier
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl EnrichmentConfig {
    /// Backoff policy between attempts of one record
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
            self.max_attempts,
        )
    }

    /// Batch size for a run over `total` records
    pub fn batch_size_for(&self, total: usize) -> usize {
        self.batch_size_tiers
            .iter()
            .find(|tier| total <= tier.max_records)
            .map_or(self.max_batch_size, |tier| tier.batch_size)
            .max(1)
    }
}

/// Configuration for a single pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for one search request end-to-end, in seconds
    #[serde(default = "default_pipeline_timeout_secs")]
    pub timeout_secs: u64,

    /// Cap for the number of results a caller may request
    #[serde(default = "default_pipeline_max_results")]
    pub max_results: usize,

    /// Whether records are enriched at all
    #[serde(default = "default_enrich")]
    pub enrich: bool,
}

// Default implementations

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            base_url: default_search_base_url(),
            api_key: None,
            user_agent: default_user_agent(),
            connect_timeout_secs: default_search_connect_timeout_secs(),
            timeout_secs: default_search_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            max_results: default_max_results(),
            databases: default_databases(),
            case_types: default_case_types(),
            patent_types: default_patent_types(),
            output_fields: default_output_fields(),
            date_range_years: default_date_range_years(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_ai_provider(),
            api_base_url: default_ai_api_base_url(),
            model: default_ai_model(),
            api_key: None,
            connect_timeout_secs: default_ai_connect_timeout_secs(),
            timeout_secs: default_ai_timeout_secs(),
            max_retries: default_ai_max_retries(),
            base_retry_delay_ms: default_ai_base_retry_delay_ms(),
            rate_limit_multiplier: default_rate_limit_multiplier(),
            transient_multiplier: default_transient_multiplier(),
            max_retry_delay_ms: default_ai_max_retry_delay_ms(),
            temperature: default_temperature(),
            max_tokens_features: default_max_tokens_features(),
            max_tokens_keywords: default_max_tokens_keywords(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            max_attempts: default_enrichment_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            max_delay_multiplier: default_max_delay_multiplier(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            batch_size_tiers: default_batch_size_tiers(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_pipeline_timeout_secs(),
            max_results: default_pipeline_max_results(),
            enrich: default_enrich(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate providers
        let valid_search_providers = ["gpss", "mock"];
        if !valid_search_providers.contains(&self.search.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid search provider '{}'. Must be one of: {:?}",
                self.search.provider, valid_search_providers
            )));
        }

        let valid_ai_providers = ["openai", "offline"];
        if !valid_ai_providers.contains(&self.ai.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid AI provider '{}'. Must be one of: {:?}",
                self.ai.provider, valid_ai_providers
            )));
        }

        // Validate timeouts
        let timeouts = [
            ("search.connect_timeout_secs", self.search.connect_timeout_secs),
            ("search.timeout_secs", self.search.timeout_secs),
            ("ai.connect_timeout_secs", self.ai.connect_timeout_secs),
            ("ai.timeout_secs", self.ai.timeout_secs),
            (
                "enrichment.attempt_timeout_secs",
                self.enrichment.attempt_timeout_secs,
            ),
            ("pipeline.timeout_secs", self.pipeline.timeout_secs),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(Error::config(format!("{key} must be greater than 0")));
            }
        }

        // A single AI request must fit inside one enrichment attempt
        if self.ai.timeout_secs > self.enrichment.attempt_timeout_secs {
            return Err(Error::config(format!(
                "ai.timeout_secs ({}) must not exceed enrichment.attempt_timeout_secs ({})",
                self.ai.timeout_secs, self.enrichment.attempt_timeout_secs
            )));
        }

        // Validate search limits
        if self.search.max_results == 0 {
            return Err(Error::config(
                "search.max_results must be greater than 0".to_string(),
            ));
        }
        if self.search.max_results > MAX_RESULTS_CAP {
            return Err(Error::config(format!(
                "search.max_results too large (max {MAX_RESULTS_CAP}, got {})",
                self.search.max_results
            )));
        }
        if self.search.databases.is_empty() {
            return Err(Error::config(
                "search.databases must name at least one database".to_string(),
            ));
        }

        // Validate AI retry policy
        if self.ai.max_retries == 0 {
            return Err(Error::config(
                "ai.max_retries must be greater than 0".to_string(),
            ));
        }
        if self.ai.rate_limit_multiplier < 1.0 || self.ai.transient_multiplier < 1.0 {
            return Err(Error::config(
                "ai backoff multipliers must be at least 1.0".to_string(),
            ));
        }

        // Validate enrichment configuration
        if self.enrichment.max_concurrent_requests == 0 {
            return Err(Error::config(
                "enrichment.max_concurrent_requests must be greater than 0".to_string(),
            ));
        }
        if self.enrichment.max_concurrent_requests > 256 {
            return Err(Error::config(format!(
                "enrichment.max_concurrent_requests too large (max 256, got {})",
                self.enrichment.max_concurrent_requests
            )));
        }
        if self.enrichment.max_attempts == 0 {
            return Err(Error::config(
                "enrichment.max_attempts must be greater than 0".to_string(),
            ));
        }
        if self.enrichment.max_delay_multiplier < 1.0 {
            return Err(Error::config(format!(
                "enrichment.max_delay_multiplier must be at least 1.0 (got {})",
                self.enrichment.max_delay_multiplier
            )));
        }
        if self.enrichment.max_batch_size == 0 {
            return Err(Error::config(
                "enrichment.max_batch_size must be greater than 0".to_string(),
            ));
        }
        if self
            .enrichment
            .batch_size_tiers
            .iter()
            .any(|tier| tier.batch_size == 0)
        {
            return Err(Error::config(
                "enrichment.batch_size_tiers entries must have a batch_size greater than 0"
                    .to_string(),
            ));
        }
        if self
            .enrichment
            .batch_size_tiers
            .windows(2)
            .any(|pair| pair[0].max_records >= pair[1].max_records)
        {
            return Err(Error::config(
                "enrichment.batch_size_tiers must be sorted by ascending max_records".to_string(),
            ));
        }

        Ok(())
    }

    /// Saves the configuration to a TOML file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, toml_string)
            .map_err(|e| Error::config(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
