//! AI judge integrations for slipcheck.
//!
//! Implements the `LlmProvider` trait for Anthropic and Ollama, plus a mock
//! judge for tests and offline demos, and loads the `slipcheck.toml` config.

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod ollama;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, SlipcheckConfig};
pub use slipcheck_core::error::ProviderError;
