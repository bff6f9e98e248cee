//! Trait definition for search backends

use crate::decode::RawSearchResponse;
use crate::stats::SearchStats;
use async_trait::async_trait;
use patentsearch_core::error::Result;
use patentsearch_core::{BooleanQuery, SearchParams};

/// Trait for patent search backends
///
/// A backend performs exactly one request per call and decodes the body;
/// retry policy belongs to the caller.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one search and return the decoded envelope
    ///
    /// # Errors
    /// - `Error::Transport` on network failure or timeout
    /// - `Error::HttpStatus` on a non-2xx answer
    /// - `Error::Protocol` when the body lacks the envelope key
    /// - `Error::Decode` when nothing could be recovered from the body
    async fn search(&self, query: &BooleanQuery, params: &SearchParams) -> Result<RawSearchResponse>;

    /// Check a user credential against the service
    ///
    /// Returns `Ok(false)` when the credential is rejected and an error when
    /// the service could not be reached.
    async fn verify_credential(&self, credential: &str) -> Result<bool>;

    /// Snapshot of this backend's request counters
    fn stats(&self) -> SearchStats;

    /// Short backend name for logs
    fn name(&self) -> &str;
}
