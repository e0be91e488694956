//! The enumerated set of supported providers and their endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported chat-completion providers. All speak the OpenAI-compatible
/// `chat/completions` wire format; they differ in endpoint and default model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    DeepSeek,
    OpenAi,
    Zhipu,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::DeepSeek,
        ProviderKind::OpenAi,
        ProviderKind::Zhipu,
    ];

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "https://api.deepseek.com",
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Zhipu => "https://open.bigmodel.cn",
        }
    }

    /// Path of the chat completions endpoint relative to the base URL.
    pub fn completions_path(self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "/chat/completions",
            ProviderKind::OpenAi => "/v1/chat/completions",
            ProviderKind::Zhipu => "/api/paas/v4/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek-chat",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Zhipu => "glm-4-flash",
        }
    }

    /// Environment variable that overrides this provider's API key.
    pub fn key_env_var(self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "SCORECARD_DEEPSEEK_KEY",
            ProviderKind::OpenAi => "SCORECARD_OPENAI_KEY",
            ProviderKind::Zhipu => "SCORECARD_ZHIPU_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::DeepSeek => write!(f, "deepseek"),
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Zhipu => write!(f, "zhipu"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "openai" => Ok(ProviderKind::OpenAi),
            "zhipu" | "zhipuai" | "智谱" => Ok(ProviderKind::Zhipu),
            other => Err(format!(
                "unknown provider: {other} (expected deepseek, openai or zhipu)"
            )),
        }
    }
}
