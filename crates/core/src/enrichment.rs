//! Enrichment output attached to canonical records

use crate::record::CanonicalPatentRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of features or effects kept per record
pub const MAX_ANNOTATIONS: usize = 5;

/// Where an enrichment result came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnrichmentSource {
    /// Parsed from the AI service response
    Ai,
    /// Produced by the deterministic keyword-table generator
    Fallback,
    /// Enrichment failed after all attempts; content is the fallback
    Degraded { reason: String },
}

/// Technical features and effects derived for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub technical_features: Vec<String>,
    pub technical_effects: Vec<String>,
    pub source: EnrichmentSource,
}

impl EnrichmentResult {
    pub fn new(
        technical_features: Vec<String>,
        technical_effects: Vec<String>,
        source: EnrichmentSource,
    ) -> Self {
        Self {
            technical_features,
            technical_effects,
            source,
        }
    }

    /// Re-labels this result as degraded, keeping its content
    pub fn degraded(self, reason: impl Into<String>) -> Self {
        Self {
            source: EnrichmentSource::Degraded {
                reason: reason.into(),
            },
            ..self
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.source, EnrichmentSource::Degraded { .. })
    }
}

/// A canonical record plus its enrichment, when one was computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPatentRecord {
    #[serde(flatten)]
    pub record: CanonicalPatentRecord,
    pub enrichment: Option<EnrichmentResult>,
}

impl EnrichedPatentRecord {
    pub fn is_degraded(&self) -> bool {
        self.enrichment
            .as_ref()
            .is_some_and(EnrichmentResult::is_degraded)
    }
}

/// Counters of one enrichment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchState {
    /// Failure share of the attempted records, 0.0 when nothing was attempted
    pub fn failure_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.failed as f64 / self.attempted as f64
        }
    }

    pub fn absorb(&mut self, other: BatchState) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Per-run metadata handed to callers together with the records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Items returned by the search service
    pub inputs: usize,
    /// Records emitted with AI or fallback content
    pub succeeded: usize,
    /// Records whose enrichment exhausted its attempts
    pub degraded: usize,
    /// Items dropped by the normalizer for lack of a title
    pub dropped: usize,
    /// Records never enriched because the run was cancelled or timed out
    pub skipped: usize,
    pub cancelled: bool,
    /// Set when the search response was undecodable and treated as empty
    pub warning: Option<String>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_keeps_content() {
        let result = EnrichmentResult::new(
            vec!["feature".to_string()],
            vec!["effect".to_string()],
            EnrichmentSource::Fallback,
        )
        .degraded("timeout");

        assert!(result.is_degraded());
        assert_eq!(result.technical_features, vec!["feature"]);
        assert_eq!(
            result.source,
            EnrichmentSource::Degraded {
                reason: "timeout".to_string()
            }
        );
    }

    #[test]
    fn test_failure_rate() {
        let mut state = BatchState::default();
        assert_eq!(state.failure_rate(), 0.0);
        state.absorb(BatchState {
            attempted: 10,
            succeeded: 8,
            failed: 2,
        });
        assert!((state.failure_rate() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metadata_serializes_elapsed_as_millis() {
        let metadata = RunMetadata {
            elapsed: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["elapsed"], 1500);
    }
}
