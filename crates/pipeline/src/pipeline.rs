//! One search request end to end: query, search, normalize, enrich

use crate::types::{SearchRequest, SearchResponse};
use patentsearch_core::config::{PipelineConfig, SearchConfig};
use patentsearch_core::error::{Error, Result};
use patentsearch_core::{
    retry, BackoffPolicy, CanonicalPatentRecord, EnrichedPatentRecord, RunMetadata,
};
use patentsearch_enrichment::{EnrichmentRun, EnrichmentScheduler};
use patentsearch_normalizer::normalize_payload;
use patentsearch_query::QueryBuilder;
use patentsearch_search_client::SearchBackend;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Search pipeline over one backend and an optional enrichment scheduler
pub struct SearchPipeline {
    builder: QueryBuilder,
    backend: Arc<dyn SearchBackend>,
    scheduler: Option<EnrichmentScheduler>,
    search_config: SearchConfig,
    config: PipelineConfig,
    search_policy: BackoffPolicy,
}

impl SearchPipeline {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        scheduler: Option<EnrichmentScheduler>,
        search_config: SearchConfig,
        config: PipelineConfig,
    ) -> Self {
        info!("Initializing search pipeline");
        info!("  Search backend: {}", backend.name());
        info!("  Enrichment: {}", if scheduler.is_some() { "enabled" } else { "disabled" });
        info!("  Deadline: {}s", config.timeout_secs);

        Self {
            builder: QueryBuilder::new(),
            backend,
            scheduler,
            search_config,
            config,
            search_policy: BackoffPolicy::default(),
        }
    }

    /// Backoff policy for the search request
    pub fn with_search_policy(mut self, policy: BackoffPolicy) -> Self {
        self.search_policy = policy;
        self
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Runs one search request.
    ///
    /// Fails only when the request is invalid or no search envelope could be
    /// obtained. An undecodable response becomes an empty result with a
    /// warning. When `cancel` fires or the deadline passes during enrichment,
    /// the records enriched so far are returned and the rest are marked
    /// skipped.
    pub async fn run(
        &self,
        request: SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        let start = Instant::now();
        let deadline = start + Duration::from_secs(self.config.timeout_secs);
        request.validate()?;

        let query = self.builder.build(&request.groups, &request.extra_terms);
        if query.is_unconstrained() {
            info!("Starting patent search without keyword constraint");
        } else {
            info!("Starting patent search: {}", query.expression);
        }

        let max_results = self.effective_max_results(request.max_results);
        let params = self.search_config.search_params(Some(max_results));

        let search = retry(&self.search_policy, "Patent search", |_| {
            self.backend.search(&query, &params)
        });
        let searched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled("Search cancelled before a response arrived")),
            searched = tokio::time::timeout_at(deadline, search) => searched,
        };

        let mut metadata = RunMetadata::default();
        let payload = match searched {
            Err(_) => {
                return Err(Error::cancelled(format!(
                    "Search did not finish within {}s",
                    self.config.timeout_secs
                )))
            }
            Ok(Ok(response)) => Some(response.payload),
            Ok(Err(Error::Decode(reason))) => {
                warn!("Search response could not be decoded, returning no results: {reason}");
                metadata.warning = Some(format!("Undecodable search response: {reason}"));
                None
            }
            Ok(Err(e)) => return Err(e),
        };

        let (records, dropped) = match payload {
            Some(payload) => self.normalize(&payload)?,
            None => (Vec::new(), 0),
        };
        metadata.inputs = records.len() + dropped;
        metadata.dropped = dropped;

        let enrich = request.enrich.unwrap_or(self.config.enrich);
        let records = match (&self.scheduler, enrich) {
            (Some(scheduler), true) if !records.is_empty() => {
                let run = self.enrich(scheduler, records, cancel, deadline).await;
                metadata.succeeded = run.state.succeeded;
                metadata.degraded = run.degraded();
                metadata.skipped = run.skipped;
                metadata.cancelled = run.cancelled;
                run.records
            }
            _ => records
                .into_iter()
                .map(|record| EnrichedPatentRecord {
                    record,
                    enrichment: None,
                })
                .collect(),
        };

        metadata.elapsed = start.elapsed();
        info!(
            "Search finished in {:?}: {} records, {} degraded, {} dropped, {} skipped",
            metadata.elapsed,
            records.len(),
            metadata.degraded,
            metadata.dropped,
            metadata.skipped
        );

        Ok(SearchResponse {
            query,
            records,
            metadata,
        })
    }

    fn effective_max_results(&self, requested: Option<usize>) -> usize {
        let requested = requested.unwrap_or(self.search_config.max_results);
        if requested > self.config.max_results {
            warn!(
                "Requested {requested} results, capping at {}",
                self.config.max_results
            );
        }
        requested.min(self.config.max_results).max(1)
    }

    fn normalize(&self, payload: &Value) -> Result<(Vec<CanonicalPatentRecord>, usize)> {
        let batch = normalize_payload(payload)?;
        if batch.dropped > 0 {
            warn!("Dropped {} items without a title", batch.dropped);
        }
        debug!("Normalized {} records", batch.records.len());
        Ok((batch.records, batch.dropped))
    }

    async fn enrich(
        &self,
        scheduler: &EnrichmentScheduler,
        records: Vec<CanonicalPatentRecord>,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> EnrichmentRun {
        let token = cancel.child_token();
        let enrichment = scheduler.enrich(records, &token);
        tokio::pin!(enrichment);

        tokio::select! {
            run = &mut enrichment => run,
            _ = tokio::time::sleep_until(deadline) => {
                warn!(
                    "Search deadline of {}s reached, cancelling enrichment",
                    self.config.timeout_secs
                );
                token.cancel();
                enrichment.await
            }
        }
    }
}
