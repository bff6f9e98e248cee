//! Keyword suggestion from a free-text technical description

use crate::chat::ChatClient;
use crate::prompts::{format_prompt, KEYWORDS_SYSTEM, KEYWORDS_USER};
use crate::response::parse_reply;
use crate::text::{truncate_description, MAX_DESCRIPTION_CHARS};
use patentsearch_core::config::AiConfig;
use patentsearch_core::retry::{retry, BackoffPolicy};
use patentsearch_core::search_models::{KeywordGroup, KeywordOrigin};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_KEYWORD_COUNT: usize = 3;
pub const DEFAULT_SYNONYM_COUNT: usize = 5;

const MIN_TERM_CHARS: usize = 2;

/// Keywords too generic to narrow a patent search
const GENERIC_WORDS: &[&str] = &[
    "系統",
    "system",
    "方法",
    "method",
    "裝置",
    "device",
    "技術",
    "technology",
];

/// Terms recognized in descriptions when the AI service cannot help
const SYNONYM_TABLE: &[(&str, [&str; 5])] = &[
    ("測試", ["test", "檢測", "測量", "檢驗", "驗證"]),
    ("控制", ["control", "控制器", "調節", "管理", "操控"]),
    ("自動化", ["automation", "自動", "智能化", "無人化", "機械化"]),
    ("半導體", ["semiconductor", "晶片", "IC", "芯片", "電子元件"]),
    ("探針", ["probe", "測試針", "探測器", "檢測器", "測試頭"]),
    ("精密", ["precision", "精確", "高精度", "微米級", "準確"]),
    ("系統", ["system", "設備", "裝置", "機台", "平台"]),
    ("處理", ["processing", "處理器", "加工", "操作", "運算"]),
];

/// Filler groups when the description names too few known terms
const DEFAULT_GROUPS: &[(&str, [&str; 5])] = &[
    ("檢測", ["detection", "測試", "檢驗", "測量", "分析"]),
    ("控制", ["control", "調節", "管理", "操控", "指令"]),
    ("自動化", ["automation", "智能", "機械", "無人", "自動"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Ai,
    Fallback,
}

/// Suggested keyword groups, each a primary keyword followed by its synonyms
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordSuggestion {
    pub groups: Vec<KeywordGroup>,
    pub source: SuggestionSource,
}

/// Suggests keyword groups for a search, falling back to a synonym table
pub struct KeywordSuggester {
    chat: Option<Arc<ChatClient>>,
    policy: BackoffPolicy,
    max_tokens: u32,
    num_keywords: usize,
    num_synonyms: usize,
}

impl KeywordSuggester {
    pub fn new(chat: Arc<ChatClient>, config: &AiConfig) -> Self {
        Self {
            chat: Some(chat),
            policy: config.backoff_policy(),
            max_tokens: config.max_tokens_keywords,
            num_keywords: DEFAULT_KEYWORD_COUNT,
            num_synonyms: DEFAULT_SYNONYM_COUNT,
        }
    }

    /// A suggester that only uses the synonym table
    pub fn offline() -> Self {
        Self {
            chat: None,
            policy: BackoffPolicy::default(),
            max_tokens: 0,
            num_keywords: DEFAULT_KEYWORD_COUNT,
            num_synonyms: DEFAULT_SYNONYM_COUNT,
        }
    }

    pub fn with_counts(mut self, num_keywords: usize, num_synonyms: usize) -> Self {
        self.num_keywords = num_keywords.max(1);
        self.num_synonyms = num_synonyms.min(DEFAULT_SYNONYM_COUNT);
        self
    }

    /// Suggests groups for `description`; never fails
    pub async fn suggest(&self, description: &str) -> KeywordSuggestion {
        let description = truncate_description(description.trim(), MAX_DESCRIPTION_CHARS);

        if let Some(chat) = &self.chat {
            match self.suggest_with_ai(chat, description).await {
                Some(groups) => {
                    info!("AI suggested {} keyword groups", groups.len());
                    return KeywordSuggestion {
                        groups,
                        source: SuggestionSource::Ai,
                    };
                }
                None => warn!("Keyword suggestion via AI failed, using synonym table"),
            }
        }

        KeywordSuggestion {
            groups: fallback_suggestions(description, self.num_keywords, self.num_synonyms),
            source: SuggestionSource::Fallback,
        }
    }

    async fn suggest_with_ai(&self, chat: &ChatClient, description: &str) -> Option<Vec<KeywordGroup>> {
        let num_keywords = self.num_keywords.to_string();
        let num_synonyms = self.num_synonyms.to_string();
        let prompt = format_prompt(
            KEYWORDS_USER,
            &[
                ("description", description),
                ("num_keywords", num_keywords.as_str()),
                ("num_synonyms", num_synonyms.as_str()),
            ],
        );

        let reply = match retry(&self.policy, "Keyword suggestion", |_| {
            chat.complete(KEYWORDS_SYSTEM, &prompt, self.max_tokens)
        })
        .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Keyword suggestion request failed: {e}");
                return None;
            }
        };

        let Some(parsed) = parse_reply(&reply) else {
            chat.record_parse_failure();
            return None;
        };
        let groups = validate_suggestions(&parsed, self.num_keywords, self.num_synonyms);
        (!groups.is_empty()).then_some(groups)
    }
}

/// Validated groups from a parsed `keywords_with_synonyms` reply.
///
/// Keywords shorter than two characters or too generic are dropped;
/// synonyms are trimmed, deduplicated and capped at
/// [`DEFAULT_SYNONYM_COUNT`].
pub fn validate_suggestions(parsed: &Value, num_keywords: usize, num_synonyms: usize) -> Vec<KeywordGroup> {
    let Some(entries) = parsed.get("keywords_with_synonyms").and_then(Value::as_array) else {
        return Vec::new();
    };
    let num_synonyms = num_synonyms.min(DEFAULT_SYNONYM_COUNT);

    entries
        .iter()
        .filter_map(|entry| {
            let keyword = entry.get("keyword")?.as_str()?.trim();
            if keyword.chars().count() < MIN_TERM_CHARS || is_generic(keyword) {
                return None;
            }

            let mut synonyms: Vec<String> = Vec::new();
            for synonym in entry
                .get("synonyms")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(str::trim)
            {
                if synonym.chars().count() >= MIN_TERM_CHARS
                    && synonym != keyword
                    && !synonyms.iter().any(|existing| existing == synonym)
                {
                    synonyms.push(synonym.to_string());
                }
            }
            synonyms.truncate(num_synonyms);

            Some(KeywordGroup::with_synonyms(keyword, synonyms).origin(KeywordOrigin::Suggested))
        })
        .take(num_keywords)
        .collect()
}

fn is_generic(keyword: &str) -> bool {
    let lower = keyword.to_lowercase();
    GENERIC_WORDS.contains(&lower.as_str())
}

/// Groups for the known terms found in `description`, topped up with defaults
pub fn fallback_suggestions(description: &str, num_keywords: usize, num_synonyms: usize) -> Vec<KeywordGroup> {
    let to_group = |keyword: &str, synonyms: &[&str; 5]| {
        let synonyms = synonyms
            .iter()
            .take(num_synonyms)
            .map(ToString::to_string)
            .collect();
        KeywordGroup::with_synonyms(keyword, synonyms).origin(KeywordOrigin::Suggested)
    };

    let mut groups: Vec<KeywordGroup> = SYNONYM_TABLE
        .iter()
        .filter(|(keyword, _)| description.contains(keyword))
        .take(num_keywords)
        .map(|(keyword, synonyms)| to_group(keyword, synonyms))
        .collect();

    for (keyword, synonyms) in DEFAULT_GROUPS {
        if groups.len() >= num_keywords {
            break;
        }
        if !groups.iter().any(|group| group.primary() == Some(*keyword)) {
            groups.push(to_group(keyword, synonyms));
        }
    }
    groups
}
