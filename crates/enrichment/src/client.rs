//! Resilient AI annotation client

use crate::annotator::Annotator;
use crate::chat::ChatClient;
use crate::fallback::fallback_annotation;
use crate::prompts::{format_prompt, FEATURES_SYSTEM, FEATURES_USER};
use crate::response::{parse_reply, post_process, AnnotationKind};
use crate::stats::AiStats;
use crate::text::PatentText;
use async_trait::async_trait;
use patentsearch_core::config::AiConfig;
use patentsearch_core::enrichment::{EnrichmentResult, EnrichmentSource};
use patentsearch_core::error::Result;
use patentsearch_core::record::CanonicalPatentRecord;
use std::sync::Arc;
use tracing::{debug, warn};

/// Annotates records through the AI service.
///
/// Each call to [`Annotator::annotate`] makes one request; service failures
/// come back as errors for the scheduler to retry. A reply that cannot be
/// used yields fallback content instead of an error.
pub struct ResilientAiClient {
    chat: Arc<ChatClient>,
    max_tokens: u32,
}

impl ResilientAiClient {
    pub fn new(chat: Arc<ChatClient>, config: &AiConfig) -> Self {
        Self {
            chat,
            max_tokens: config.max_tokens_features,
        }
    }

    pub fn stats(&self) -> AiStats {
        self.chat.stats()
    }

    fn fallback(&self, record: &CanonicalPatentRecord) -> EnrichmentResult {
        self.chat.record_fallback();
        fallback_annotation(record)
    }

    /// Turns a reply into annotations, or fallback content when it is unusable
    fn interpret(&self, record: &CanonicalPatentRecord, reply: &str) -> EnrichmentResult {
        let Some(parsed) = parse_reply(reply) else {
            self.chat.record_parse_failure();
            warn!("AI reply held no JSON object, using fallback");
            return self.fallback(record);
        };

        let features = post_process(parsed.get("technical_features"), AnnotationKind::Feature);
        let effects = post_process(parsed.get("technical_effects"), AnnotationKind::Effect);
        if features.is_empty() {
            warn!("AI reply held no usable technical features, using fallback");
            return self.fallback(record);
        }
        EnrichmentResult::new(features, effects, EnrichmentSource::Ai)
    }
}

#[async_trait]
impl Annotator for ResilientAiClient {
    async fn annotate(&self, record: &CanonicalPatentRecord) -> Result<EnrichmentResult> {
        let text = PatentText::from_record(record);
        if text.is_empty() {
            debug!("Record has no text to analyze, using fallback");
            return Ok(self.fallback(record));
        }

        let prompt = format_prompt(
            FEATURES_USER,
            &[
                ("title", text.title.as_str()),
                ("abstract", text.abstract_text.as_str()),
                ("claims", text.claims.as_str()),
            ],
        );

        let reply = self
            .chat
            .complete(FEATURES_SYSTEM, &prompt, self.max_tokens)
            .await?;

        Ok(self.interpret(record, &reply))
    }

    fn name(&self) -> &str {
        self.chat.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> ResilientAiClient {
        let config = AiConfig::default();
        let chat = Arc::new(ChatClient::new(&config).unwrap());
        ResilientAiClient::new(chat, &config)
    }

    fn record() -> CanonicalPatentRecord {
        let mut record = CanonicalPatentRecord::with_title("精密探針測試裝置");
        record.abstract_text = "一種用於晶圓測試的精密探針裝置。".to_string();
        record
    }

    #[test]
    fn test_interpret_valid_reply() {
        let reply = r#"```json
{"technical_features": ["特徵1：彈性探針陣列結構設計"], "technical_effects": ["功效1：提升晶圓測試良率"]}
```"#;
        let result = client().interpret(&record(), reply);
        assert_eq!(result.source, EnrichmentSource::Ai);
        assert_eq!(result.technical_features, vec!["彈性探針陣列結構設計"]);
        assert_eq!(result.technical_effects, vec!["提升晶圓測試良率"]);
    }

    #[test]
    fn test_unusable_reply_falls_back() {
        let client = client();
        let result = client.interpret(&record(), "抱歉，我無法完成");
        assert_eq!(result.source, EnrichmentSource::Fallback);
        assert_eq!(result, fallback_annotation(&record()));

        let stats = client.stats();
        assert_eq!(stats.json_parse_failures, 1);
        assert_eq!(stats.fallbacks, 1);
    }

    #[test]
    fn test_reply_without_features_falls_back() {
        let result = client().interpret(&record(), r#"{"technical_effects": ["提升晶圓測試良率"]}"#);
        assert_eq!(result.source, EnrichmentSource::Fallback);
    }
}
