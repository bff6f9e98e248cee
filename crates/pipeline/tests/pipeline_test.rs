//! End-to-end runs over the mock search backend and scripted collaborators

use async_trait::async_trait;
use patentsearch_core::config::{EnrichmentConfig, PipelineConfig, SearchConfig};
use patentsearch_core::enrichment::{EnrichmentResult, EnrichmentSource};
use patentsearch_core::error::{Error, Result};
use patentsearch_core::{BooleanQuery, CanonicalPatentRecord, Config, KeywordGroup, SearchParams};
use patentsearch_enrichment::{Annotator, EnrichmentScheduler, OfflineAnnotator};
use patentsearch_pipeline::{create_pipeline, SearchPipeline, SearchRequest};
use patentsearch_search_client::{
    decode_body, MockSearchBackend, RawSearchResponse, SearchBackend, SearchStats,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn mock_config() -> Config {
    let mut config = Config::default();
    config.search.provider = "mock".to_string();
    config.ai.provider = "offline".to_string();
    config
}

fn pipeline_with(
    backend: Arc<dyn SearchBackend>,
    annotator: Arc<dyn Annotator>,
    config: PipelineConfig,
) -> SearchPipeline {
    let scheduler = EnrichmentScheduler::new(annotator, EnrichmentConfig::default());
    SearchPipeline::new(backend, Some(scheduler), SearchConfig::default(), config)
}

/// Backend failing with scripted errors before answering like the mock
struct ScriptedBackend {
    failures: Vec<fn() -> Error>,
    calls: AtomicUsize,
    inner: MockSearchBackend,
}

impl ScriptedBackend {
    fn failing_with(failures: Vec<fn() -> Error>) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            inner: MockSearchBackend::new(),
        }
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(&self, query: &BooleanQuery, params: &SearchParams) -> Result<RawSearchResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.get(call) {
            Some(failure) => Err(failure()),
            None => self.inner.search(query, params).await,
        }
    }

    async fn verify_credential(&self, _credential: &str) -> Result<bool> {
        Ok(true)
    }

    fn stats(&self) -> SearchStats {
        self.inner.stats()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend answering with a fixed body through the real decoder
struct FixedBodyBackend(&'static str);

#[async_trait]
impl SearchBackend for FixedBodyBackend {
    async fn search(&self, _query: &BooleanQuery, _params: &SearchParams) -> Result<RawSearchResponse> {
        decode_body(self.0)
    }

    async fn verify_credential(&self, _credential: &str) -> Result<bool> {
        Ok(true)
    }

    fn stats(&self) -> SearchStats {
        SearchStats::default()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Annotator that never finishes for titles containing `slow_marker`
struct StallingAnnotator {
    slow_marker: &'static str,
}

#[async_trait]
impl Annotator for StallingAnnotator {
    async fn annotate(&self, record: &CanonicalPatentRecord) -> Result<EnrichmentResult> {
        if record.title.contains(self.slow_marker) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(EnrichmentResult::new(
            vec!["技術特徵: scripted".to_string()],
            vec!["技術功效: scripted".to_string()],
            EnrichmentSource::Ai,
        ))
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

fn probe_request() -> SearchRequest {
    SearchRequest::new(vec![KeywordGroup::new(["探針", "probe"])])
        .with_extra_terms(vec!["semiconductor".to_string()])
}

fn broad_request() -> SearchRequest {
    SearchRequest::new(vec![KeywordGroup::new([
        "探針",
        "automated",
        "precision",
        "自動化",
    ])])
}

#[tokio::test]
async fn test_mock_run_normalizes_and_enriches() {
    let pipeline = create_pipeline(&mock_config()).unwrap();

    let response = pipeline
        .run(probe_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        response.query.expression,
        "(探針 OR probe) AND (semiconductor)"
    );
    assert_eq!(response.records.len(), 1);
    let enriched = &response.records[0];
    assert_eq!(enriched.record.title, "半導體晶圓探針卡結構");
    assert_eq!(enriched.record.applicants, vec!["旺矽科技股份有限公司"]);
    assert_eq!(enriched.record.country, "TW");
    let enrichment = enriched.enrichment.as_ref().unwrap();
    assert_eq!(enrichment.source, EnrichmentSource::Fallback);

    assert_eq!(response.metadata.inputs, 1);
    assert_eq!(response.metadata.succeeded, 1);
    assert_eq!(response.metadata.degraded, 0);
    assert!(response.metadata.warning.is_none());
    assert!(!response.metadata.cancelled);
}

#[tokio::test]
async fn test_records_keep_service_order() {
    let pipeline = create_pipeline(&mock_config()).unwrap();

    let response = pipeline
        .run(broad_request(), &CancellationToken::new())
        .await
        .unwrap();

    let titles: Vec<&str> = response
        .records
        .iter()
        .map(|r| r.record.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec![
            "半導體晶圓探針卡結構",
            "Automated test handler with vision alignment",
            "精密位置決め装置",
            "自動化檢測系統",
        ]
    );
}

#[tokio::test]
async fn test_enrichment_can_be_disabled_per_request() {
    let pipeline = create_pipeline(&mock_config()).unwrap();

    let response = pipeline
        .run(probe_request().with_enrichment(false), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.records.len(), 1);
    assert!(response.records[0].enrichment.is_none());
    assert_eq!(response.metadata.succeeded, 0);
}

#[tokio::test]
async fn test_empty_query_searches_without_keyword_constraint() {
    let pipeline = create_pipeline(&mock_config()).unwrap();
    let request = SearchRequest::new(vec![KeywordGroup::new(["  ", "()"])]);

    let response = pipeline
        .run(request, &CancellationToken::new())
        .await
        .unwrap();
    assert!(response.query.is_unconstrained());
    assert_eq!(response.records.len(), 4);
    assert_eq!(response.metadata.inputs, 4);
}

#[tokio::test(start_paused = true)]
async fn test_transient_search_failures_are_retried() {
    fn busy() -> Error {
        Error::http_status(503, "busy")
    }
    fn reset() -> Error {
        Error::transport("connection reset")
    }
    let backend = Arc::new(ScriptedBackend::failing_with(vec![busy, reset]));
    let pipeline = pipeline_with(
        backend.clone(),
        Arc::new(OfflineAnnotator),
        PipelineConfig::default(),
    );

    let response = pipeline
        .run(probe_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    assert_eq!(response.records.len(), 1);
}

#[tokio::test]
async fn test_client_error_is_a_hard_failure() {
    fn forbidden() -> Error {
        Error::http_status(403, "forbidden")
    }
    let backend = Arc::new(ScriptedBackend::failing_with(vec![forbidden]));
    let pipeline = pipeline_with(
        backend.clone(),
        Arc::new(OfflineAnnotator),
        PipelineConfig::default(),
    );

    let err = pipeline
        .run(probe_request(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_undecodable_response_is_empty_success() {
    let pipeline = pipeline_with(
        Arc::new(FixedBodyBackend("<html>Service Unavailable</html>")),
        Arc::new(OfflineAnnotator),
        PipelineConfig::default(),
    );

    let response = pipeline
        .run(probe_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(response.records.is_empty());
    assert!(response.metadata.warning.is_some());
}

#[tokio::test]
async fn test_missing_envelope_is_protocol_failure() {
    let pipeline = pipeline_with(
        Arc::new(FixedBodyBackend(r#"{"result":[]}"#)),
        Arc::new(OfflineAnnotator),
        PipelineConfig::default(),
    );

    let err = pipeline
        .run(probe_request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn test_service_error_block_is_a_hard_failure() {
    let pipeline = pipeline_with(
        Arc::new(FixedBodyBackend(
            r#"{"gpss-API":{"error":{"message":"invalid userCode"}}}"#,
        )),
        Arc::new(OfflineAnnotator),
        PipelineConfig::default(),
    );

    let err = pipeline
        .run(probe_request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Service(_)));
}

#[tokio::test]
async fn test_untitled_items_are_counted_as_dropped() {
    let pipeline = pipeline_with(
        Arc::new(FixedBodyBackend(
            r#"{"gpss-API":{"patent":{"patentcontent":[
                {"patent-title":{"title":"探針卡"}},
                {"abstract":{"p":"no title here"}}
            ]}}}"#,
        )),
        Arc::new(OfflineAnnotator),
        PipelineConfig::default(),
    );

    let response = pipeline
        .run(probe_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.records.len(), 1);
    assert_eq!(response.metadata.inputs, 2);
    assert_eq!(response.metadata.dropped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_returns_partial_results() {
    let pipeline = pipeline_with(
        Arc::new(MockSearchBackend::new()),
        Arc::new(StallingAnnotator {
            slow_marker: "探針",
        }),
        PipelineConfig {
            timeout_secs: 5,
            ..PipelineConfig::default()
        },
    );

    let response = pipeline
        .run(broad_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.records.len(), 4);
    assert!(response.metadata.cancelled);
    assert_eq!(response.metadata.skipped, 1);
    assert!(response.records[0].enrichment.is_none());
    assert!(response.records[1..].iter().all(|r| r.enrichment.is_some()));
}

#[tokio::test]
async fn test_cancel_before_search_is_an_error() {
    let pipeline = create_pipeline(&mock_config()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = pipeline.run(probe_request(), &token).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled(_)));
}
