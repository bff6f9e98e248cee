//! HTTP client for the GPSS patent search API

use crate::backend::SearchBackend;
use crate::decode::{decode_body, RawSearchResponse};
use crate::stats::{SearchStats, StatsRecorder};
use async_trait::async_trait;
use patentsearch_core::config::SearchConfig;
use patentsearch_core::error::{Error, Result};
use patentsearch_core::{BooleanQuery, SearchParams};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Characters left unescaped in the query string; `+` must stay literal in `+AB`/`+CL`
const QUERY_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':')
    .remove(b',')
    .remove(b'+')
    .remove(b'(')
    .remove(b')')
    .remove(b'|');

/// Credentials shorter than this are rejected without a probe
const MIN_CREDENTIAL_LEN: usize = 16;

/// Maximum characters of an error body kept in error messages
const ERROR_BODY_PREVIEW: usize = 500;

/// Search client for the GPSS API with a pooled HTTP connection set
pub struct GpssSearchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    verified_credentials: Mutex<HashSet<String>>,
    stats: StatsRecorder,
}

impl GpssSearchClient {
    /// Create a client from the search configuration
    pub fn new(config: &SearchConfig) -> Result<Self> {
        info!("Initializing GPSS search client");
        info!("  Base URL: {}", config.base_url);
        info!(
            "  Timeouts: connect {}s, total {}s",
            config.connect_timeout_secs, config.timeout_secs
        );
        info!("  Pooled connections per host: {}", config.pool_max_idle_per_host);

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!("No search credential configured; set search.api_key or GPSS_API_KEY");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            verified_credentials: Mutex::new(HashSet::new()),
            stats: StatsRecorder::default(),
        })
    }

    /// Runs a search with an explicit credential instead of the configured one
    pub async fn search_with_credential(
        &self,
        credential: &str,
        query: &BooleanQuery,
        params: &SearchParams,
    ) -> Result<RawSearchResponse> {
        let url = build_request_url(&self.base_url, credential, query, params);
        info!("Sending search request: {}", redact(&url, credential));
        debug!("Query expression: {}", query.expression);

        self.stats.request_started();
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        debug!("Search service responded with {status}");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            warn!("Search service returned HTTP {status}: {preview}");
            return Err(Error::http_status(status.as_u16(), preview));
        }

        let body = response.text().await?;
        match decode_body(&body) {
            Ok(decoded) => {
                self.stats.succeeded(decoded.was_repaired());
                Ok(decoded)
            }
            Err(e) => {
                self.stats.decode_failed();
                Err(e)
            }
        }
    }

    fn credential(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::config("Search credential is not configured"))
    }

    fn is_verified(&self, credential: &str) -> bool {
        self.verified_credentials
            .lock()
            .map(|verified| verified.contains(credential))
            .unwrap_or(false)
    }

    fn remember_verified(&self, credential: &str) {
        if let Ok(mut verified) = self.verified_credentials.lock() {
            verified.insert(credential.to_string());
        }
    }
}

#[async_trait]
impl SearchBackend for GpssSearchClient {
    async fn search(&self, query: &BooleanQuery, params: &SearchParams) -> Result<RawSearchResponse> {
        let credential = self.credential()?;
        self.search_with_credential(credential, query, params).await
    }

    async fn verify_credential(&self, credential: &str) -> Result<bool> {
        let credential = credential.trim();
        if credential.len() < MIN_CREDENTIAL_LEN {
            warn!("Credential rejected: shorter than {MIN_CREDENTIAL_LEN} characters");
            return Ok(false);
        }
        if self.is_verified(credential) {
            return Ok(true);
        }

        let probe = BooleanQuery::applied_to_all_fields("(test)".to_string());
        let params = SearchParams {
            max_results: 1,
            databases: vec!["TWA".to_string(), "TWB".to_string()],
            case_types: "A,B".to_string(),
            patent_types: "I,M".to_string(),
            output_fields: "PN,TI".to_string(),
            date_range: None,
            extra: Default::default(),
        };

        match self.search_with_credential(credential, &probe, &params).await {
            Ok(_) => {
                info!("Credential verified: {}...", preview_credential(credential));
                self.remember_verified(credential);
                Ok(true)
            }
            Err(e @ (Error::Transport(_) | Error::Decode(_))) => Err(e),
            Err(Error::HttpStatus { status, .. }) if status >= 500 => Err(Error::http_status(
                status,
                "Search service unavailable while verifying credential",
            )),
            Err(e) => {
                warn!("Credential verification failed: {e}");
                Ok(false)
            }
        }
    }

    fn stats(&self) -> SearchStats {
        self.stats.snapshot()
    }

    fn name(&self) -> &str {
        "gpss"
    }
}

/// Builds the full request URL; `+` stays literal so `+AB`/`+CL` OR with the title
pub fn build_request_url(
    base_url: &str,
    credential: &str,
    query: &BooleanQuery,
    params: &SearchParams,
) -> String {
    let mut pairs: Vec<(String, String)> = vec![
        ("userCode".to_string(), credential.to_string()),
        ("expFmt".to_string(), "json".to_string()),
        (
            "expQty".to_string(),
            params.max_results.clamp(1, 1000).to_string(),
        ),
        ("expFld".to_string(), params.output_fields.clone()),
        ("patDB".to_string(), params.databases.join(",")),
        ("patAG".to_string(), params.case_types.clone()),
        ("patTY".to_string(), params.patent_types.clone()),
    ];

    for (field, expression) in &query.fields {
        pairs.push((field.param_name().to_string(), expression.clone()));
    }
    if let Some(range) = &params.date_range {
        pairs.push(("ID".to_string(), range.to_param()));
    }
    for (key, value) in &params.extra {
        pairs.push((key.clone(), value.clone()));
    }

    let query_string = pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_SAFE),
                utf8_percent_encode(value, QUERY_SAFE)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{base_url}?{query_string}")
}

fn preview_credential(credential: &str) -> String {
    credential.chars().take(4).collect()
}

/// Replaces the credential in a URL before it is logged
fn redact(url: &str, credential: &str) -> String {
    if credential.is_empty() {
        return url.to_string();
    }
    url.replace(
        &utf8_percent_encode(credential, QUERY_SAFE).to_string(),
        &format!("{}***", preview_credential(credential)),
    )
}
