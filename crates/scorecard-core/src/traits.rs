//! Chat provider trait.
//!
//! Implemented by the `scorecard-providers` crate; the report generator only
//! ever sees `dyn ChatProvider`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Default system prompt sent with every report request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一个专业的助手";

/// Trait for chat-completion backends that turn a prompt into text.
///
/// Implementations make exactly one attempt per call: no retries, no
/// streaming.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider identifier (e.g. "deepseek").
    fn name(&self) -> &str;

    /// Model the provider sends requests to.
    fn model(&self) -> &str;

    /// Send one system + user exchange and return the generated text.
    ///
    /// Failures are `ProviderError` values wrapped in `anyhow::Error`.
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse>;
}

/// One system + user message exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }

    /// Reject requests that must never reach the network.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.user_prompt.trim().is_empty() {
            return Err(ProviderError::EmptyPrompt);
        }
        Ok(())
    }
}

/// Generated text plus call metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    /// Model that actually produced the response.
    pub model: String,
    pub latency_ms: u64,
}
