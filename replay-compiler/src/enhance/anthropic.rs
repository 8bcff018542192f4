//! Anthropic Messages API enhancer

use super::http_retry::{send_with_retry, RetryPolicy};
use super::{EnhanceConfig, EnhanceError, EnhancementRequest, ScriptEnhancer};
use crate::codegen::bundle_builder::describe;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};
use tracing::debug;

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const API_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

struct CacheEntry {
    script: String,
    stored_at: Instant,
}

/// Enhancer backed by the Anthropic Messages API
pub struct AnthropicEnhancer {
    config: EnhanceConfig,
    api_key: Option<String>,
    client: Client,
    cache: Mutex<HashMap<u64, CacheEntry>>,
}

impl AnthropicEnhancer {
    /// API key from `ANTHROPIC_API_KEY`
    pub fn new(config: EnhanceConfig) -> Self {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        Self::build(config, api_key)
    }

    pub fn with_api_key(config: EnhanceConfig, api_key: impl Into<String>) -> Self {
        Self::build(config, Some(api_key.into()))
    }

    fn build(config: EnhanceConfig, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config,
            api_key,
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    fn cache_key(&self, request: &EnhancementRequest) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.config.model.hash(&mut hasher);
        request.framework.hash(&mut hasher);
        request.basic_script.hash(&mut hasher);
        hasher.finish()
    }

    fn cached(&self, key: u64) -> Option<String> {
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        let cache = self.cache.lock();
        cache
            .get(&key)
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .map(|entry| entry.script.clone())
    }

    /// Drop entries older than the cache TTL
    pub fn purge_expired(&self) {
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        self.cache.lock().retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    pub fn build_prompt(&self, request: &EnhancementRequest) -> String {
        let framework = request.framework;
        let mut prompt = format!(
            "You are improving a generated {} browser automation script written in {}.\n\n",
            framework,
            framework.language()
        );

        prompt.push_str(&format!("Recording: {}\n", request.metadata.name));
        if let Some(url) = &request.metadata.start_url {
            prompt.push_str(&format!("Start URL: {}\n", url));
        }
        prompt.push_str("\nRecorded steps:\n");
        for (i, interaction) in request.trace.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, describe(interaction)));
        }

        prompt.push_str(&format!(
            "\nBasic script:\n```{}\n{}\n```\n\n",
            framework.language(),
            request.basic_script
        ));
        prompt.push_str(
            "Improve robustness with explicit waits, retries around flaky steps and clear error messages.\n\
             Keep every `Step N:` comment in order. Keep reading secrets and settings from the environment; \
             never inline credentials.\n\
             Reply with the complete script only, in a single fenced code block.",
        );
        prompt
    }
}

/// Body of the first fenced block, or the whole reply when there is none
pub fn extract_code(reply: &str) -> String {
    let Some(open) = reply.find("```") else {
        return reply.trim().to_string();
    };
    let after_fence = &reply[open + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim_end().to_string(),
        None => body.trim_end().to_string(),
    }
}

#[async_trait]
impl ScriptEnhancer for AnthropicEnhancer {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn enhance(&self, request: &EnhancementRequest) -> Result<String, EnhanceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(EnhanceError::NotConfigured(format!("{} ({} unset)", PROVIDER, API_KEY_ENV)));
        };

        let key = self.cache_key(request);
        if let Some(script) = self.cached(key) {
            debug!(framework = %request.framework, "Enhancement cache hit");
            return Ok(script);
        }

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user",
                content: self.build_prompt(request),
            }],
        };

        let response = send_with_retry(
            &self.client,
            |client| {
                client
                    .post(&self.config.endpoint)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", API_VERSION)
                    .header("content-type", "application/json")
                    .json(&body)
            },
            RetryPolicy::new(self.config.max_retries),
            PROVIDER,
        )
        .await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| EnhanceError::MalformedResponse(e.to_string()))?;
        let reply = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.trim().is_empty())
            .ok_or(EnhanceError::EmptyResponse)?;

        let script = extract_code(&reply);
        if script.is_empty() {
            return Err(EnhanceError::EmptyResponse);
        }

        debug!(framework = %request.framework, bytes = script.len(), "Enhanced script received");
        self.cache.lock().insert(
            key,
            CacheEntry {
                script: script.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(script)
    }
}
