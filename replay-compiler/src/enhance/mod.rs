//! Script Enhancement
//!
//! Optional, best-effort post-processing of an already valid basic script by
//! an external provider. Providers are tried in order; with the default
//! policy a failure anywhere yields the basic script unchanged.

pub mod http_retry;
pub mod anthropic;

pub use anthropic::AnthropicEnhancer;
pub use http_retry::{send_with_retry, RetryPolicy};

use crate::codegen::Framework;
use crate::trace::{InteractionTrace, TraceMetadata};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Enhancement errors
#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("{provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("{provider} failed after {attempts} attempt(s)")]
    RetriesExhausted { provider: String, attempts: u32 },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned an empty script")]
    EmptyResponse,

    #[error("no enhancement providers configured")]
    NoProviders,

    #[error("all {} enhancement provider(s) failed: {}", .0.len(), .0.join("; "))]
    AllProvidersFailed(Vec<String>),
}

/// Input handed to a provider: the basic script plus the trace it came from
#[derive(Debug, Clone)]
pub struct EnhancementRequest {
    pub basic_script: String,
    pub framework: Framework,
    pub trace: Arc<InteractionTrace>,
    pub metadata: TraceMetadata,
}

impl EnhancementRequest {
    pub fn new(basic_script: impl Into<String>, framework: Framework, trace: Arc<InteractionTrace>) -> Self {
        let metadata = trace.metadata().clone();
        Self {
            basic_script: basic_script.into(),
            framework,
            trace,
            metadata,
        }
    }
}

/// A service that may return an improved version of a basic script
#[async_trait]
pub trait ScriptEnhancer: Send + Sync {
    fn name(&self) -> &str;

    async fn enhance(&self, request: &EnhancementRequest) -> Result<String, EnhanceError>;
}

/// What to do when no provider succeeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementPolicy {
    /// Keep the basic script
    #[default]
    FallbackToBasic,
    /// Surface the failure to the caller
    Strict,
}

/// `[enhance]` settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Run enhancement when generating a bundle
    pub enabled: bool,
    pub policy: EnhancementPolicy,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// How long an enhanced script is reused for an identical request
    pub cache_ttl_secs: u64,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            policy: EnhancementPolicy::FallbackToBasic,
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            temperature: 0.3,
            max_tokens: 4096,
            max_retries: 3,
            timeout_secs: 60,
            cache_ttl_secs: 3600,
        }
    }
}

/// Where the returned script came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EnhancementOutcome {
    Enhanced { provider: String },
    Basic { reason: Option<String> },
}

/// Script returned by [`EnhancerChain::run`]
#[derive(Debug, Clone)]
pub struct EnhancedScript {
    pub source: String,
    pub outcome: EnhancementOutcome,
}

impl EnhancedScript {
    pub fn is_enhanced(&self) -> bool {
        matches!(self.outcome, EnhancementOutcome::Enhanced { .. })
    }
}

/// Ordered list of providers
#[derive(Default)]
pub struct EnhancerChain {
    providers: Vec<Box<dyn ScriptEnhancer>>,
    policy: EnhancementPolicy,
}

impl EnhancerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with the Anthropic provider when an API key is available
    pub fn from_config(config: &EnhanceConfig) -> Self {
        let chain = Self::new().with_policy(config.policy);
        let anthropic = AnthropicEnhancer::new(config.clone());
        if anthropic.is_configured() {
            chain.push(anthropic)
        } else {
            warn!("{} is unset, enhancement will keep basic scripts", anthropic::API_KEY_ENV);
            chain
        }
    }

    pub fn with_policy(mut self, policy: EnhancementPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn push(mut self, provider: impl ScriptEnhancer + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn policy(&self) -> EnhancementPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// First successful provider wins
    pub async fn enhance(&self, request: &EnhancementRequest) -> Result<String, EnhanceError> {
        self.first_success(request).await.map(|(_, script)| script)
    }

    async fn first_success(&self, request: &EnhancementRequest) -> Result<(String, String), EnhanceError> {
        if self.providers.is_empty() {
            return Err(EnhanceError::NoProviders);
        }

        let mut failures = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.enhance(request).await {
                Ok(script) if !script.trim().is_empty() => {
                    info!(provider = provider.name(), framework = %request.framework, "Script enhanced");
                    return Ok((provider.name().to_string(), script));
                }
                Ok(_) => {
                    warn!(provider = provider.name(), "Provider returned an empty script");
                    failures.push(format!("{}: {}", provider.name(), EnhanceError::EmptyResponse));
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Enhancement provider failed");
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }
        Err(EnhanceError::AllProvidersFailed(failures))
    }

    /// Apply the chain's policy to the providers' result
    pub async fn run(&self, request: &EnhancementRequest) -> Result<EnhancedScript, EnhanceError> {
        match (self.first_success(request).await, self.policy) {
            (Ok((provider, source)), _) => Ok(EnhancedScript {
                source,
                outcome: EnhancementOutcome::Enhanced { provider },
            }),
            (Err(e), EnhancementPolicy::FallbackToBasic) => {
                debug!(framework = %request.framework, error = %e, "Keeping basic script");
                Ok(basic(request, e))
            }
            (Err(e), EnhancementPolicy::Strict) => Err(e),
        }
    }
}

/// Enhance with a single provider, falling back to the basic script on any failure
pub async fn enhance_or_fallback(enhancer: &dyn ScriptEnhancer, request: &EnhancementRequest) -> EnhancedScript {
    match enhancer.enhance(request).await {
        Ok(source) if !source.trim().is_empty() => EnhancedScript {
            source,
            outcome: EnhancementOutcome::Enhanced {
                provider: enhancer.name().to_string(),
            },
        },
        Ok(_) => basic(request, EnhanceError::EmptyResponse),
        Err(e) => {
            warn!(provider = enhancer.name(), error = %e, "Enhancement failed, keeping basic script");
            basic(request, e)
        }
    }
}

fn basic(request: &EnhancementRequest, reason: EnhanceError) -> EnhancedScript {
    EnhancedScript {
        source: request.basic_script.clone(),
        outcome: EnhancementOutcome::Basic {
            reason: Some(reason.to_string()),
        },
    }
}
