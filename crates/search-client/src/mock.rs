//! Mock search backend serving fixed sample records

use crate::backend::SearchBackend;
use crate::decode::{decode_body, RawSearchResponse, ENVELOPE_KEY};
use crate::stats::{SearchStats, StatsRecorder};
use async_trait::async_trait;
use patentsearch_core::error::Result;
use patentsearch_core::{BooleanQuery, SearchParams};
use serde_json::Value;

/// Sample body in the service's own shape, including one of its escape
/// malformations so the repair path is exercised.
const SAMPLE_RESPONSE: &str = r#"{"gpss-API":{"patent":{"patentcontent":[
{"@database":"TWB","@type":"B","patent-title":{"title":"半導體晶圓探針卡結構","english-title":"Probe card structure for semiconductor wafers"},
 "parties":{"applicants":{"applicant":[{"name":"旺矽科技股份有限公司","address":{"country-code":"TW"}}]},"inventors":{"inventor":[{"name":"陳大明"},{"name":"林小華"}]}},
 "abstract":{"p":["一種用於半導體晶圓測試的探針卡，包含精密定位機構與自動化控制電路。"]},
 "claims":{"claim":[{"claim-text":"一種探針卡，包含基板與複數探針。"},{"claim-text":"如請求項1所述之探針卡，其中探針為彈性探針。"}]},
 "publication-reference":{"doc-number":"I812345","date":"20230601"},"application-reference":{"doc-number":"111100001","date":"20220105"},
 "classifications-ipc":{"ipc":[{"keyValue":"G01R 1/073"},{"keyValue":"H01L 21/66"}]}},
{"@database":"USA","@type":"A","patent-title":{"english-title":"Automated test handler with vision alignment"},
 "parties":{"applicants":{"applicant":{"english-name":"Acme Test Systems Inc.","address":{"country-code":"US"}}}},
 "abstract":"An automated test handler aligns chips using a camera \< 5 um accuracy and controls contact force.",
 "publication-reference":{"doc-number":"US20240012345A1","date":"20240111"},
 "classifications-ipc":{"ipc":"G01R 31/28"}},
{"@database":"JPB","patent-title":{"title":"\精密位置決め装置","english-title":"Precision positioning device"},
 "applicants":"株式会社精機",
 "abstract":{"content":"A precision stage for semiconductor inspection with detection circuit."},
 "priority-claims":{"date":"20190920"}},
{"@database":"CNA","patent-title":{"chinese-title":"自動化檢測系統"},
 "parties":{"applicants":{"applicant":{"chinese-name":"深圳檢測科技有限公司"}}},
 "abstract":{"p":"一種自動化檢測系統，用於晶片測試與資料分析。"}}
]}}}"#;

/// Backend returning the sample records that match the query terms
#[derive(Debug, Default)]
pub struct MockSearchBackend {
    stats: StatsRecorder,
}

impl MockSearchBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn search(&self, query: &BooleanQuery, params: &SearchParams) -> Result<RawSearchResponse> {
        self.stats.request_started();
        let mut response = match decode_body(SAMPLE_RESPONSE) {
            Ok(response) => response,
            Err(e) => {
                self.stats.decode_failed();
                return Err(e);
            }
        };

        let groups = expression_groups(&query.expression);
        if let Some(items) = response
            .payload
            .get_mut(ENVELOPE_KEY)
            .and_then(|envelope| envelope.pointer_mut("/patent/patentcontent"))
            .and_then(Value::as_array_mut)
        {
            items.retain(|item| matches_groups(item, &groups));
            items.truncate(params.max_results);
        }

        self.stats.succeeded(response.was_repaired());
        Ok(response)
    }

    async fn verify_credential(&self, credential: &str) -> Result<bool> {
        Ok(credential.trim().len() >= 16)
    }

    fn stats(&self) -> SearchStats {
        self.stats.snapshot()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Lower-cased OR-terms of each top-level AND group
fn expression_groups(expression: &str) -> Vec<Vec<String>> {
    expression
        .split(") AND (")
        .map(|group| {
            group
                .trim_matches(|c: char| c == '(' || c == ')')
                .split(" OR ")
                .map(|term| term.trim().trim_matches('"').replace("\\\"", "\"").to_lowercase())
                .filter(|term| !term.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|terms| !terms.is_empty())
        .collect()
}

fn matches_groups(item: &Value, groups: &[Vec<String>]) -> bool {
    let text = item.to_string().to_lowercase();
    groups
        .iter()
        .all(|terms| terms.iter().any(|term| text.contains(term.as_str())))
}
