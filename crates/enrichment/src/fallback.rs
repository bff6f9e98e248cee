//! Deterministic annotations from a keyword table
//!
//! Used whenever the AI service is unavailable or its reply is unusable.
//! Never fails and never touches the network.

use crate::annotator::Annotator;
use async_trait::async_trait;
use patentsearch_core::enrichment::{EnrichmentResult, EnrichmentSource};
use patentsearch_core::error::Result;
use patentsearch_core::record::{is_placeholder, CanonicalPatentRecord};
use tracing::debug;

/// Maximum entries per list in generated annotations
pub const MAX_FALLBACK_ITEMS: usize = 3;

/// Domain terms and the feature/effect pair they imply
const FEATURE_RULES: &[(&[&str], &str, &str)] = &[
    (&["測試", "test"], "測試功能模組", "提升測試效率"),
    (&["自動", "auto"], "自動化控制系統", "減少人工操作"),
    (&["精密", "precision"], "精密定位機構", "提高操作精度"),
    (&["控制", "control"], "智能控制算法", "增強系統穩定性"),
    (&["檢測", "detection"], "檢測分析模組", "提高檢測準確性"),
    (&["機械", "mechanical"], "機械傳動機構", "改善機械性能"),
    (&["電路", "circuit"], "電路設計結構", "優化電路性能"),
    (&["介面", "interface"], "介面連接機制", "提升連接可靠性"),
];

const DEFAULT_FEATURES: [&str; 3] = ["創新技術架構", "優化設計方案", "系統整合機制"];
const DEFAULT_EFFECTS: [&str; 3] = ["技術性能提升", "應用效果改善", "運作效率增強"];

/// Annotations derived from the record's title and abstract
pub fn fallback_annotation(record: &CanonicalPatentRecord) -> EnrichmentResult {
    let mut text = record.title.to_lowercase();
    if !is_placeholder(&record.abstract_text) {
        text.push(' ');
        text.push_str(&record.abstract_text.to_lowercase());
    }

    let mut features: Vec<String> = Vec::new();
    let mut effects: Vec<String> = Vec::new();
    for (terms, feature, effect) in FEATURE_RULES {
        if terms.iter().any(|term| text.contains(term)) {
            push_unique(&mut features, feature);
            push_unique(&mut effects, effect);
        }
    }

    if features.is_empty() {
        features = DEFAULT_FEATURES.iter().map(ToString::to_string).collect();
        effects = DEFAULT_EFFECTS.iter().map(ToString::to_string).collect();
    }
    features.truncate(MAX_FALLBACK_ITEMS);
    effects.truncate(MAX_FALLBACK_ITEMS);

    EnrichmentResult::new(features, effects, EnrichmentSource::Fallback)
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Annotator that only uses the keyword table
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineAnnotator;

#[async_trait]
impl Annotator for OfflineAnnotator {
    async fn annotate(&self, record: &CanonicalPatentRecord) -> Result<EnrichmentResult> {
        debug!("Offline annotation for '{}'", record.title);
        Ok(fallback_annotation(record))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
