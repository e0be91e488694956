//! scorecard-providers — chat-completion provider integrations.
//!
//! Implements the `ChatProvider` trait for DeepSeek, OpenAI and Zhipu (all
//! OpenAI-compatible), loads `scorecard.toml`, and ships a mock provider.

pub mod chat;
pub mod config;
pub mod kind;
pub mod mock;

pub use chat::ChatCompletionsProvider;
pub use config::{create_provider, load_config, load_config_from, ProviderConfig, ScorecardConfig};
pub use kind::ProviderKind;
pub use scorecard_core::error::ProviderError;
