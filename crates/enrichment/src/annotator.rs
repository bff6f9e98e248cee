//! Trait definition for record annotators

use async_trait::async_trait;
use patentsearch_core::enrichment::EnrichmentResult;
use patentsearch_core::error::Result;
use patentsearch_core::record::CanonicalPatentRecord;

/// Produces technical features and effects for one record
///
/// An `Err` means this attempt failed and may be retried by the caller; an
/// unusable but successful reply is reported as `Ok` with fallback content.
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn annotate(&self, record: &CanonicalPatentRecord) -> Result<EnrichmentResult>;

    /// Short annotator name for logs
    fn name(&self) -> &str;
}
