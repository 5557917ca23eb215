//! Provider module for askcsv
//!
//! This module contains the chat provider abstraction and implementations
//! for OpenAI-compatible endpoints and Ollama.

pub mod base;
pub mod ollama;
pub mod openai;

pub use base::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, ModelInfo, Provider,
    TokenUsage, ToolCall,
};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{AskCsvError, Result};

/// Create a provider instance for a model
///
/// # Arguments
///
/// * `config` - Provider configuration
/// * `model` - Model identifier resolved from the selected tier
///
/// # Errors
///
/// Returns error if the provider type is invalid or initialization fails
/// (for OpenAI, a missing API key)
///
/// # Examples
///
/// ```
/// use askcsv::config::ProviderConfig;
/// use askcsv::providers::create_provider;
///
/// let config = ProviderConfig {
///     provider_type: "ollama".to_string(),
///     openai: Default::default(),
///     ollama: Default::default(),
/// };
/// let provider = create_provider(&config, "llama3.2:latest").unwrap();
/// assert_eq!(provider.get_current_model().unwrap(), "llama3.2:latest");
/// ```
pub fn create_provider(config: &ProviderConfig, model: &str) -> Result<Box<dyn Provider>> {
    match config.provider_type.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(&config.openai, model)?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(&config.ollama, model)?)),
        other => Err(AskCsvError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}

/// Builds providers on demand
///
/// A chat session rebuilds its agent when the model tier changes; the
/// factory hides which backend the new provider talks to.
pub trait ProviderFactory: Send + Sync {
    /// Create a provider bound to `model`
    fn create(&self, model: &str) -> Result<Box<dyn Provider>>;
}

/// Factory backed by the loaded provider configuration
#[derive(Debug, Clone)]
pub struct ConfigProviderFactory {
    config: ProviderConfig,
}

impl ConfigProviderFactory {
    /// Create a factory from provider configuration
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl ProviderFactory for ConfigProviderFactory {
    fn create(&self, model: &str) -> Result<Box<dyn Provider>> {
        create_provider(&self.config, model)
    }
}
