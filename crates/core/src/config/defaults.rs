//! Default values and functions for configuration

use super::BatchSizeTier;

// Default constants
pub(crate) const DEFAULT_SEARCH_PROVIDER: &str = "gpss";
pub(crate) const DEFAULT_SEARCH_BASE_URL: &str =
    "https://tiponet.tipo.gov.tw/gpss1/gpsskmc/gpss_api";
pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub(crate) const DEFAULT_OUTPUT_FIELDS: &str = "PN,AN,ID,AD,TI,AX,PA,IN,AB,IC,CS,CL,AG,PD";
pub(crate) const DEFAULT_AI_PROVIDER: &str = "openai";
pub(crate) const DEFAULT_AI_API_BASE_URL: &str = "http://localhost:8001";
pub(crate) const DEFAULT_AI_MODEL: &str = "Qwen2.5-72B-Instruct";

/// Hard cap of results per search request accepted by the service
pub const MAX_RESULTS_CAP: usize = 1000;

pub(crate) fn default_search_provider() -> String {
    DEFAULT_SEARCH_PROVIDER.to_string()
}

pub(crate) fn default_search_base_url() -> String {
    DEFAULT_SEARCH_BASE_URL.to_string()
}

pub(crate) fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

pub(crate) fn default_search_connect_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_search_timeout_secs() -> u64 {
    120
}

pub(crate) fn default_pool_max_idle_per_host() -> usize {
    3
}

pub(crate) fn default_max_results() -> usize {
    50
}

pub(crate) fn default_databases() -> Vec<String> {
    [
        "TWA", "TWB", "USA", "USB", "JPA", "JPB", "EPA", "EPB", "KPA", "KPB", "CNA", "CNB", "WO",
        "SEAA", "SEAB", "OTA", "OTB",
    ]
    .iter()
    .map(|code| code.to_string())
    .collect()
}

pub(crate) fn default_case_types() -> String {
    "A,B".to_string()
}

pub(crate) fn default_patent_types() -> String {
    "I,M".to_string()
}

pub(crate) fn default_output_fields() -> String {
    DEFAULT_OUTPUT_FIELDS.to_string()
}

pub(crate) fn default_date_range_years() -> u32 {
    10
}

pub(crate) fn default_ai_provider() -> String {
    DEFAULT_AI_PROVIDER.to_string()
}

pub(crate) fn default_ai_api_base_url() -> String {
    DEFAULT_AI_API_BASE_URL.to_string()
}

pub(crate) fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

pub(crate) fn default_ai_connect_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_ai_timeout_secs() -> u64 {
    180
}

pub(crate) fn default_ai_max_retries() -> u32 {
    3
}

pub(crate) fn default_ai_base_retry_delay_ms() -> u64 {
    2000
}

pub(crate) fn default_rate_limit_multiplier() -> f64 {
    3.0
}

pub(crate) fn default_transient_multiplier() -> f64 {
    2.0
}

pub(crate) fn default_ai_max_retry_delay_ms() -> u64 {
    60_000
}

pub(crate) fn default_temperature() -> f32 {
    0.3
}

pub(crate) fn default_max_tokens_features() -> u32 {
    800
}

pub(crate) fn default_max_tokens_keywords() -> u32 {
    400
}

pub(crate) fn default_max_concurrent_requests() -> usize {
    16
}

pub(crate) fn default_enrichment_max_attempts() -> u32 {
    3
}

pub(crate) fn default_retry_base_delay_ms() -> u64 {
    1000
}

pub(crate) fn default_retry_max_delay_ms() -> u64 {
    8000
}

pub(crate) fn default_batch_delay_ms() -> u64 {
    100
}

pub(crate) fn default_max_delay_multiplier() -> f64 {
    2.0
}

pub(crate) fn default_attempt_timeout_secs() -> u64 {
    180
}

pub(crate) fn default_batch_size_tiers() -> Vec<BatchSizeTier> {
    vec![
        BatchSizeTier {
            max_records: 50,
            batch_size: 10,
        },
        BatchSizeTier {
            max_records: 200,
            batch_size: 15,
        },
    ]
}

pub(crate) fn default_max_batch_size() -> usize {
    20
}

pub(crate) fn default_pipeline_timeout_secs() -> u64 {
    600
}

pub(crate) fn default_pipeline_max_results() -> usize {
    MAX_RESULTS_CAP
}

pub(crate) fn default_enrich() -> bool {
    true
}
