//! Integration tests for the search client surface

use patentsearch_core::{BooleanQuery, SearchConfig};
use patentsearch_search_client::{create_search_backend, decode_body, DecodeTier, ENVELOPE_KEY};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_mock_provider_from_config() {
    let config = SearchConfig {
        provider: "mock".to_string(),
        ..SearchConfig::default()
    };
    let backend = create_search_backend(&config).unwrap();
    assert_eq!(backend.name(), "mock");

    let query = BooleanQuery::applied_to_all_fields("(automated) AND (test)".to_string());
    let response = backend
        .search(&query, &config.search_params(None))
        .await
        .unwrap();

    let items = response.payload[ENVELOPE_KEY]["patent"]["patentcontent"]
        .as_array()
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(backend.stats().requests, 1);
}

#[test]
fn test_unknown_provider_is_rejected() {
    let config = SearchConfig {
        provider: "bing".to_string(),
        ..SearchConfig::default()
    };
    assert!(create_search_backend(&config).is_err());
}

#[tokio::test]
async fn test_mock_verifies_by_length() {
    let config = SearchConfig {
        provider: "mock".to_string(),
        ..SearchConfig::default()
    };
    let backend = create_search_backend(&config).unwrap();
    assert!(backend.verify_credential("0123456789abcdef").await.unwrap());
    assert!(!backend.verify_credential("tooshort").await.unwrap());
}

#[test]
fn test_repaired_payload_matches_clean_payload() {
    let clean = r#"{"gpss-API":{"patent":{"patentcontent":[{"abstract":"a < b, 精密"}]}}}"#;
    let dirty = r#"{"gpss-API":{"patent":{"patentcontent":[{"abstract":"a \< b, \精密",}]}}}"#;

    let repaired = decode_body(dirty).unwrap();
    assert_eq!(repaired.tier, DecodeTier::Repaired);
    assert_eq!(repaired.payload, decode_body(clean).unwrap().payload);
}
