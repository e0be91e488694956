//! Scorecard configuration and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use scorecard_core::store::StorePaths;
use scorecard_core::traits::{ChatProvider, DEFAULT_SYSTEM_PROMPT};

use crate::chat::{ChatCompletionsProvider, DEFAULT_TIMEOUT_SECS};
use crate::kind::ProviderKind;

/// Configuration for a single chat provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: String::new(),
            base_url: None,
            model: None,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Where the persisted data lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory the file names below are resolved against.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_roster_file")]
    pub roster_file: String,
    #[serde(default = "default_history_file")]
    pub history_file: String,
    #[serde(default = "default_schema_file")]
    pub schema_file: String,
    #[serde(default = "default_templates_file")]
    pub templates_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_roster_file() -> String {
    "students.csv".to_string()
}
fn default_history_file() -> String {
    "scores.json".to_string()
}
fn default_schema_file() -> String {
    "EVALUATION_SCHEMA.json".to_string()
}
fn default_templates_file() -> String {
    "PROMPT_TEMPLATES.json".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            roster_file: default_roster_file(),
            history_file: default_history_file(),
            schema_file: default_schema_file(),
            templates_file: default_templates_file(),
        }
    }
}

impl DataConfig {
    pub fn store_paths(&self) -> StorePaths {
        StorePaths {
            roster: self.dir.join(&self.roster_file),
            history: self.dir.join(&self.history_file),
        }
    }

    pub fn schema_path(&self) -> PathBuf {
        self.dir.join(&self.schema_file)
    }

    pub fn templates_path(&self) -> PathBuf {
        self.dir.join(&self.templates_file)
    }
}

/// Top-level scorecard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used when none is given on the command line.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Hard timeout for the chat request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// System prompt sent with every report request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub data: DataConfig,
}

fn default_provider() -> String {
    ProviderKind::DeepSeek.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for ScorecardConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            timeout_secs: default_timeout(),
            system_prompt: default_system_prompt(),
            data: DataConfig::default(),
        }
    }
}

impl ScorecardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Look up a provider by configured name, falling back to a bare config
    /// for a known provider kind (its key then has to come from elsewhere).
    pub fn provider(&self, name: &str) -> Result<ProviderConfig> {
        if let Some(config) = self.providers.get(name) {
            return Ok(config.clone());
        }
        match name.parse::<ProviderKind>() {
            Ok(kind) => Ok(entry_for_kind(&self.providers, kind)
                .and_then(|entry| self.providers.get(entry))
                .cloned()
                .unwrap_or_else(|| ProviderConfig::new(kind))),
            Err(_) => anyhow::bail!(
                "provider '{}' not found in config. Available: {:?}",
                name,
                self.providers.keys().collect::<Vec<_>>()
            ),
        }
    }
}

/// The configured entry that stands in for `kind`: the one named after the
/// kind if it has that type, else the alphabetically first entry of that type.
fn entry_for_kind(providers: &HashMap<String, ProviderConfig>, kind: ProviderKind) -> Option<&str> {
    let canonical = kind.to_string();
    if providers.get(&canonical).is_some_and(|p| p.kind == kind) {
        return providers.get_key_value(&canonical).map(|(name, _)| name.as_str());
    }
    providers
        .iter()
        .filter(|(_, p)| p.kind == kind)
        .map(|(name, _)| name.as_str())
        .min()
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    ProviderConfig {
        kind: config.kind,
        api_key: resolve_env_vars(&config.api_key),
        base_url: config.base_url.as_ref().map(|u| resolve_env_vars(u)),
        model: config.model.as_ref().map(|m| resolve_env_vars(m)),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `scorecard.toml` in the current directory
/// 2. `~/.config/scorecard/config.toml`
///
/// Environment variable overrides: `SCORECARD_DEEPSEEK_KEY`,
/// `SCORECARD_OPENAI_KEY`, `SCORECARD_ZHIPU_KEY`.
pub fn load_config() -> Result<ScorecardConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ScorecardConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("scorecard.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config_file(&path)?,
        None => ScorecardConfig::default(),
    };

    for kind in ProviderKind::ALL {
        if let Ok(key) = std::env::var(kind.key_env_var()) {
            let name = entry_for_kind(&config.providers, kind)
                .map(str::to_string)
                .unwrap_or_else(|| kind.to_string());
            config
                .providers
                .entry(name)
                .or_insert_with(|| ProviderConfig::new(kind))
                .api_key = key;
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<ScorecardConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<ScorecardConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("scorecard"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn ChatProvider>> {
    Ok(Box::new(ChatCompletionsProvider::new(
        config.kind,
        &config.api_key,
        config.base_url.clone(),
        config.model.clone(),
        timeout,
    )?))
}
