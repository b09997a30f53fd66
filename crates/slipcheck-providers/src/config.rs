//! Configuration loading and the provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use slipcheck_core::engine::AssessmentEngineConfig;
use slipcheck_core::focus::FocusConfig;
use slipcheck_core::traits::LlmProvider;

use crate::anthropic::AnthropicProvider;
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;

pub const CONFIG_FILE_NAME: &str = "slipcheck.toml";
pub const ANTHROPIC_KEY_ENV: &str = "SLIPCHECK_ANTHROPIC_KEY";

/// Configuration for a single judge provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    /// Canned replies, no network.
    Mock {
        #[serde(default)]
        response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Anthropic {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response", response)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    crate::ollama::DEFAULT_BASE_URL.to_string()
}

/// Top-level slipcheck configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlipcheckConfig {
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default judge model.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Judge temperature (0.0 keeps verdicts stable).
    #[serde(default)]
    pub default_temperature: f64,
    /// Max tokens for a judge reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Max retries on provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent escalations.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Focus Mode target times.
    #[serde(default)]
    pub focus: FocusConfig,
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "anthropic".to_string()
}
fn default_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}
fn default_max_tokens() -> u32 {
    512
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./slipcheck-reports")
}

impl Default for SlipcheckConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: 0.0,
            max_tokens: default_max_tokens(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            focus: FocusConfig::default(),
            providers: HashMap::new(),
        }
    }
}

impl SlipcheckConfig {
    /// Engine settings for a given judge model.
    pub fn engine_config(&self, model: &str) -> AssessmentEngineConfig {
        AssessmentEngineConfig {
            parallelism: self.parallelism,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            model: model.to_string(),
            temperature: self.default_temperature,
            max_tokens: self.max_tokens,
            focus: self.focus.clone(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string. Substituted values are not
/// scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `slipcheck.toml` in the current directory
/// 2. `~/.config/slipcheck/config.toml`
///
/// `SLIPCHECK_ANTHROPIC_KEY` overrides the Anthropic API key.
pub fn load_config() -> Result<SlipcheckConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SlipcheckConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                Some(local)
            } else {
                global_config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(&path)?
        }
        None => SlipcheckConfig::default(),
    };

    if let Ok(key) = std::env::var(ANTHROPIC_KEY_ENV) {
        apply_anthropic_key(&mut config, key);
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn parse_config(path: &Path) -> Result<SlipcheckConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<SlipcheckConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_anthropic_key(config: &mut SlipcheckConfig, key: String) {
    let entry = config
        .providers
        .entry("anthropic".into())
        .or_insert(ProviderConfig::Anthropic {
            api_key: String::new(),
            base_url: None,
        });
    if let ProviderConfig::Anthropic { api_key, .. } = entry {
        *api_key = key;
    }
}

fn global_config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("slipcheck"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    tracing::debug!(provider = name, "creating judge provider");
    match config {
        ProviderConfig::Anthropic { api_key, base_url } => {
            if api_key.is_empty() {
                anyhow::bail!(
                    "provider '{name}' has no API key; set {ANTHROPIC_KEY_ENV} or api_key in {CONFIG_FILE_NAME}"
                );
            }
            Ok(Box::new(AnthropicProvider::new(api_key, base_url.clone())?))
        }
        ProviderConfig::Ollama { base_url } => Ok(Box::new(OllamaProvider::new(base_url)?)),
        ProviderConfig::Mock { response } => Ok(Box::new(match response {
            Some(reply) => MockProvider::with_fixed_response(reply),
            None => MockProvider::new(vec![]),
        })),
    }
}
