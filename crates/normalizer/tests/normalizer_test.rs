//! Behavioral tests for record normalization

use patentsearch_core::record::{DEFAULT_COUNTRY, PLACEHOLDER};
use patentsearch_normalizer::{normalize, normalize_payload};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_minimal_item_scenario() {
    let item = json!({"patent-title":{"title":"Test"},"parties":{"applicants":{"applicant":{"name":"Acme"}}}});
    let record = normalize(&item).unwrap();
    assert_eq!(record.title, "Test");
    assert_eq!(record.applicants_display(), "Acme");
}

#[test]
fn test_single_applicant_object_equals_one_element_list() {
    let single = json!({"patent-title": "T", "parties": {"applicants": {"applicant": {"name": "Acme"}}}});
    let list = json!({"patent-title": "T", "parties": {"applicants": {"applicant": [{"name": "Acme"}]}}});
    assert_eq!(
        normalize(&single).unwrap().applicants_display(),
        normalize(&list).unwrap().applicants_display()
    );
}

#[test]
fn test_item_without_title_is_dropped() {
    let item = json!({"parties": {"applicants": {"applicant": {"name": "Acme"}}}, "abstract": "text"});
    assert_eq!(normalize(&item), None);
}

#[test]
fn test_title_only_item_has_every_placeholder() {
    let record = normalize(&json!({"patent-title": {"title": "Only a title"}})).unwrap();

    assert_eq!(record.applicants_display(), PLACEHOLDER);
    assert_eq!(record.inventors_display(), PLACEHOLDER);
    assert_eq!(record.ipc_display(), PLACEHOLDER);
    for field in [
        &record.abstract_text,
        &record.claims,
        &record.publication_number,
        &record.application_number,
        &record.application_date,
        &record.publication_date,
        &record.priority_date,
        &record.database,
        &record.case_type,
    ] {
        assert_eq!(field, PLACEHOLDER);
    }
    assert_eq!(record.country, DEFAULT_COUNTRY);
}

#[test]
fn test_full_item() {
    let payload = json!({"gpss-API": {"patent": {"patentcontent": [{
        "@database": "TWB",
        "@status": "B",
        "patent-title": {"title": "半導體晶圓探針卡結構", "english-title": "Probe card"},
        "parties": {
            "applicants": {"applicant": [{"name": "旺矽科技股份有限公司"}]},
            "inventors": {"inventor": [{"name": "陳大明"}, {"english-name": "Lin"}]}
        },
        "abstract": {"p": ["一種探針卡。"]},
        "claims": {"claim": {"claim-text": "一種探針卡，包含基板。"}},
        "publication-reference": {"doc-number": "I812345", "date": "20230601"},
        "application-reference": {"doc-number": "111100001", "date": "20220105"},
        "priority-claims": {"date": "20210301"},
        "classifications-ipc": {"ipc": {"keyValue": "G01R 1/073"}}
    }]}}});

    let batch = normalize_payload(&payload).unwrap();
    assert_eq!(batch.dropped, 0);
    let record = &batch.records[0];
    assert_eq!(record.title, "半導體晶圓探針卡結構");
    assert_eq!(record.inventors_display(), "陳大明; Lin");
    assert_eq!(record.claims, "1. 一種探針卡，包含基板。");
    assert_eq!(record.application_number, "111100001");
    assert_eq!(record.application_date, "20220105");
    assert_eq!(record.priority_date, "20210301");
    assert_eq!(record.ipc_codes, vec!["G01R 1/073"]);
    assert_eq!(record.country, "TW");
    assert_eq!(record.case_type, "B");
    assert_eq!(
        record.detail_url().as_deref(),
        Some("https://tiponet.tipo.gov.tw/gpss4/gpsskmc/gpssbkm?!!FRURLI812345")
    );
}
