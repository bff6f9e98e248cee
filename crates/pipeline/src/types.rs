//! Request and response models of one pipeline run

use patentsearch_core::error::{Error, Result};
use patentsearch_core::{BooleanQuery, EnrichedPatentRecord, KeywordGroup, RunMetadata};
use serde::{Deserialize, Serialize};

/// Maximum number of keyword groups in one request
const MAX_GROUPS: usize = 20;

/// One search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Keyword groups, AND-combined
    #[serde(default)]
    pub groups: Vec<KeywordGroup>,
    /// Free-form terms combined into one more OR-group
    #[serde(default)]
    pub extra_terms: Vec<String>,
    /// Results to request; the configured default when absent
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Overrides `pipeline.enrich` for this request
    #[serde(default)]
    pub enrich: Option<bool>,
}

impl SearchRequest {
    pub fn new(groups: Vec<KeywordGroup>) -> Self {
        Self {
            groups,
            ..Self::default()
        }
    }

    pub fn with_extra_terms(mut self, extra_terms: Vec<String>) -> Self {
        self.extra_terms = extra_terms;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = Some(enrich);
        self
    }

    /// Validate the request, checking group and result-count constraints
    pub fn validate(&self) -> Result<()> {
        if self.groups.len() > MAX_GROUPS {
            return Err(Error::invalid_input(format!(
                "At most {MAX_GROUPS} keyword groups are allowed, got {}",
                self.groups.len()
            )));
        }
        if self.max_results == Some(0) {
            return Err(Error::invalid_input("max_results must be at least 1"));
        }
        Ok(())
    }
}

/// Records of one run plus the query that produced them
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: BooleanQuery,
    /// In the order the search service returned them
    pub records: Vec<EnrichedPatentRecord>,
    pub metadata: RunMetadata,
}
