//! Chat-completions HTTP client for the AI service

use crate::stats::{AiStats, AiStatsRecorder};
use patentsearch_core::config::AiConfig;
use patentsearch_core::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const ERROR_BODY_PREVIEW: usize = 300;
const TOP_P: f32 = 0.8;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: Option<u64>,
}

/// One-request-per-call client for an OpenAI-compatible chat endpoint
pub struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    stats: AiStatsRecorder,
}

impl ChatClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let endpoint = format!(
            "{}/v1/chat/completions",
            config.api_base_url.trim_end_matches('/')
        );
        info!("Initializing AI chat client");
        info!("  Model: {}", config.model);
        info!("  Endpoint: {endpoint}");
        info!("  Timeout: {}s", config.timeout_secs);

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            temperature: config.temperature,
            stats: AiStatsRecorder::default(),
        })
    }

    /// Sends one system+user exchange and returns the reply text
    ///
    /// # Errors
    /// - `Error::HttpStatus` on a non-2xx answer (429 is rate limiting)
    /// - `Error::Transport` on network failure or timeout
    /// - `Error::Protocol` when the answer has no reply content
    pub async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens,
            top_p: TOP_P,
            stream: false,
        };

        self.stats.call_started();
        debug!("Sending chat request ({} prompt chars)", user.chars().count());

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            if status == StatusCode::TOO_MANY_REQUESTS {
                self.stats.rate_limited();
                warn!("AI service is rate limiting requests");
            } else {
                warn!("AI service returned error {status}: {preview}");
            }
            return Err(Error::http_status(status.as_u16(), preview));
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::protocol("AI response has no reply content"))?;

        self.stats.call_succeeded();
        if let Some(tokens) = reply.usage.and_then(|usage| usage.total_tokens) {
            debug!("AI call used {tokens} tokens");
        }
        Ok(content)
    }

    pub(crate) fn record_parse_failure(&self) {
        self.stats.parse_failed();
    }

    pub(crate) fn record_fallback(&self) {
        self.stats.fell_back();
    }

    pub fn stats(&self) -> AiStats {
        self.stats.snapshot()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}
