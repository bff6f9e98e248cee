//! Batched, concurrency-bounded enrichment of canonical records
//!
//! Records are processed batch by batch. Within a batch every record runs
//! concurrently, but each annotation attempt first takes a permit from a
//! shared semaphore, so the number of in-flight AI calls never exceeds the
//! configured ceiling regardless of batch size. Results land in slots indexed
//! by input position, so output order is input order.

use crate::annotator::Annotator;
use crate::fallback::fallback_annotation;
use futures::future::join_all;
use patentsearch_core::config::EnrichmentConfig;
use patentsearch_core::enrichment::{BatchState, EnrichedPatentRecord, EnrichmentResult};
use patentsearch_core::error::{Error, Result};
use patentsearch_core::record::CanonicalPatentRecord;
use patentsearch_core::retry::BackoffPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Failure rate above which the inter-batch delay doubles
const HIGH_FAILURE_RATE: f64 = 0.3;
/// Failure rate above which the inter-batch delay grows by half
const ELEVATED_FAILURE_RATE: f64 = 0.1;

/// Output of one enrichment run
#[derive(Debug, Clone, Default)]
pub struct EnrichmentRun {
    /// One entry per input record, in input order
    pub records: Vec<EnrichedPatentRecord>,
    pub state: BatchState,
    /// Records left without enrichment because the run was cancelled
    pub skipped: usize,
    pub cancelled: bool,
}

impl EnrichmentRun {
    pub fn degraded(&self) -> usize {
        self.records.iter().filter(|r| r.is_degraded()).count()
    }
}

enum RecordOutcome {
    Enriched(EnrichmentResult),
    Degraded(EnrichmentResult),
    Cancelled,
}

/// Delay before the next batch given the failure rate of the last one,
/// capped at `max_multiplier` times the base delay
pub fn inter_batch_delay(base: Duration, failure_rate: f64, max_multiplier: f64) -> Duration {
    let factor: f64 = if failure_rate > HIGH_FAILURE_RATE {
        2.0
    } else if failure_rate > ELEVATED_FAILURE_RATE {
        1.5
    } else {
        1.0
    };
    base.mul_f64(factor.min(max_multiplier.max(1.0)))
}

pub struct EnrichmentScheduler {
    annotator: Arc<dyn Annotator>,
    config: EnrichmentConfig,
    policy: BackoffPolicy,
    permits: Arc<Semaphore>,
}

impl EnrichmentScheduler {
    pub fn new(annotator: Arc<dyn Annotator>, config: EnrichmentConfig) -> Self {
        let concurrency = config.max_concurrent_requests.max(1);
        info!("Initializing enrichment scheduler");
        info!("  Annotator: {}", annotator.name());
        info!("  Max concurrent requests: {concurrency}");
        info!("  Attempts per record: {}", config.max_attempts);

        Self {
            policy: config.backoff_policy(),
            permits: Arc::new(Semaphore::new(concurrency)),
            annotator,
            config,
        }
    }

    /// Backoff growth between attempts; `rate_limit_multiplier` applies after a 429
    pub fn with_multipliers(mut self, multiplier: f64, rate_limit_multiplier: f64) -> Self {
        self.policy = self.policy.with_multipliers(multiplier, rate_limit_multiplier);
        self
    }

    /// Enriches every record, substituting degraded results for failures.
    ///
    /// Never fails. When `cancel` fires, in-flight records stop, remaining
    /// batches are not started, and the records done so far are kept.
    pub async fn enrich(
        &self,
        records: Vec<CanonicalPatentRecord>,
        cancel: &CancellationToken,
    ) -> EnrichmentRun {
        let total = records.len();
        if total == 0 {
            return EnrichmentRun::default();
        }

        let batch_size = self.config.batch_size_for(total);
        let total_batches = total.div_ceil(batch_size);
        let base_delay = Duration::from_millis(self.config.batch_delay_ms);
        info!("Enriching {total} records in {total_batches} batches of up to {batch_size}");

        let mut slots: Vec<Option<EnrichmentResult>> = vec![None; total];
        let mut state = BatchState::default();
        let mut cancelled = false;

        for (batch_index, batch) in records.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let offset = batch_index * batch_size;
            debug!(
                "Starting batch {}/{total_batches} (records {}-{})",
                batch_index + 1,
                offset + 1,
                offset + batch.len()
            );

            let outcomes = join_all(
                batch
                    .iter()
                    .map(|record| self.enrich_record(record, cancel)),
            )
            .await;

            let mut batch_state = BatchState::default();
            for (position, outcome) in outcomes.into_iter().enumerate() {
                let result = match outcome {
                    RecordOutcome::Enriched(result) => {
                        batch_state.attempted += 1;
                        batch_state.succeeded += 1;
                        result
                    }
                    RecordOutcome::Degraded(result) => {
                        batch_state.attempted += 1;
                        batch_state.failed += 1;
                        result
                    }
                    RecordOutcome::Cancelled => {
                        cancelled = true;
                        continue;
                    }
                };
                if let Some(slot) = slots.get_mut(offset + position) {
                    *slot = Some(result);
                }
            }
            state.absorb(batch_state);
            info!(
                "Batch {}/{total_batches} done: {} succeeded, {} failed",
                batch_index + 1,
                batch_state.succeeded,
                batch_state.failed
            );

            if cancelled {
                break;
            }
            if batch_index + 1 < total_batches {
                let delay = inter_batch_delay(
                    base_delay,
                    batch_state.failure_rate(),
                    self.config.max_delay_multiplier,
                );
                debug!("Waiting {delay:?} before the next batch");
                tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        let skipped = slots.iter().filter(|slot| slot.is_none()).count();
        if cancelled {
            warn!("Enrichment cancelled, {skipped} of {total} records left without enrichment");
        }
        info!(
            "Enrichment finished: {} succeeded, {} degraded, {skipped} skipped",
            state.succeeded, state.failed
        );

        let records = records
            .into_iter()
            .zip(slots)
            .map(|(record, enrichment)| EnrichedPatentRecord { record, enrichment })
            .collect();

        EnrichmentRun {
            records,
            state,
            skipped,
            cancelled,
        }
    }

    async fn enrich_record(
        &self,
        record: &CanonicalPatentRecord,
        cancel: &CancellationToken,
    ) -> RecordOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => RecordOutcome::Cancelled,
            outcome = self.attempt_record(record) => outcome,
        }
    }

    /// Annotates one record, retrying retryable failures with backoff.
    ///
    /// A permit is held only while a call is in flight, never during backoff.
    /// Non-retryable failures (4xx other than 429, malformed answers) degrade the
    /// record without another attempt.
    async fn attempt_record(&self, record: &CanonicalPatentRecord) -> RecordOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        let error = loop {
            let error = match self.attempt_once(record).await {
                Ok(enrichment) => return RecordOutcome::Enriched(enrichment),
                Err(Error::Cancelled(_)) => return RecordOutcome::Cancelled,
                Err(e) => e,
            };
            if !error.is_retryable() || attempt >= max_attempts {
                break error;
            }

            let backoff = self.policy.delay_after(attempt, &error);
            warn!("Enrichment of '{}' failed: {error}", record.title);
            warn!("Retrying in {backoff:?} (attempt {attempt}/{max_attempts})");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        };

        warn!(
            "Enrichment of '{}' failed after {attempt} attempt(s): {error}",
            record.title
        );
        let reason = Error::enrichment(format!("{attempt} attempt(s) failed, last error: {error}"));
        RecordOutcome::Degraded(fallback_annotation(record).degraded(reason.to_string()))
    }

    async fn attempt_once(&self, record: &CanonicalPatentRecord) -> Result<EnrichmentResult> {
        let attempt_timeout = Duration::from_secs(self.config.attempt_timeout_secs);
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::cancelled("enrichment scheduler is shutting down"))?;

        tokio::time::timeout(attempt_timeout, self.annotator.annotate(record))
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "annotation timed out after {}s",
                    attempt_timeout.as_secs()
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inter_batch_delay_tiers() {
        let base = Duration::from_millis(100);
        assert_eq!(inter_batch_delay(base, 0.0, 2.0), base);
        assert_eq!(inter_batch_delay(base, 0.1, 2.0), base);
        assert_eq!(inter_batch_delay(base, 0.2, 2.0), Duration::from_millis(150));
        assert_eq!(inter_batch_delay(base, 0.5, 2.0), Duration::from_millis(200));
    }

    #[test]
    fn test_inter_batch_delay_is_capped() {
        let base = Duration::from_millis(100);
        assert_eq!(inter_batch_delay(base, 1.0, 1.2), Duration::from_millis(120));
        assert_eq!(inter_batch_delay(base, 1.0, 0.5), base);
    }
}
