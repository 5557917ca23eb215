//! Test utilities for askcsv
//!
//! This module provides common test utilities: temporary files, a sample
//! dataset, a deterministic configuration, and mock providers.

use crate::config::Config;
use crate::dataset::DataFrame;
use crate::error::{AskCsvError, Result};
use crate::providers::{CompletionResponse, Message, Provider, ProviderFactory, TokenUsage};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// CSV text of the sample listings dataset
pub const SAMPLE_CSV: &str = "\
name,city,price,rooms,available
Loft,Austin,120.5,1,true
Cottage,Denver,95,2,false
Villa,Austin,310,4,true
Studio,Boston,,1,true
Cabin,Denver,80,2,false
Bungalow,Austin,150,3,true
";

/// Six rental listings with text, float, integer and boolean columns
///
/// `Studio` has an empty price.
pub fn sample_frame() -> DataFrame {
    DataFrame::from_reader(SAMPLE_CSV.as_bytes()).expect("sample CSV is valid")
}

/// Configuration with a fixed date and no ledger file
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.data.as_of_date = Some("2023-06-01".to_string());
    config.usage.log_path = None;
    config
}

/// Provider returning scripted responses in order
///
/// Clones share the call counter and request log. Once the script is
/// exhausted the provider answers "Done".
#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Vec<Message>>,
    usage: Option<TokenUsage>,
    model: String,
    delay: Option<Duration>,
    failure: Option<String>,
    call_count: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Provider that replies with `responses` in order
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(responses),
            usage: None,
            model: "mock-model".to_string(),
            delay: None,
            failure: None,
            call_count: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Provider whose every request fails with `message`
    pub fn failing(message: &str) -> Self {
        let mut provider = Self::new(vec![]);
        provider.failure = Some(message.to_string());
        provider
    }

    /// Report `usage` with every response
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Report `model` as the current model
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls so far
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Messages sent with each request
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests.lock().unwrap().push(messages.to_vec());
        if let Some(failure) = &self.failure {
            return Err(AskCsvError::Provider(failure.clone()).into());
        }

        let index = {
            let mut count = self.call_count.lock().unwrap();
            let index = *count;
            *count += 1;
            index
        };
        let message = self
            .responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| Message::assistant("Done"));

        Ok(match self.usage {
            Some(usage) => CompletionResponse::with_usage(message, usage),
            None => CompletionResponse::new(message),
        })
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.model.clone())
    }
}

/// Factory handing out [`MockProvider`]s bound to the requested model
///
/// All providers share one script, so responses continue in order across
/// tier switches.
#[derive(Clone)]
pub struct MockProviderFactory {
    template: MockProvider,
    fail_models: Vec<String>,
    created: Arc<Mutex<Vec<String>>>,
}

impl MockProviderFactory {
    /// Factory whose providers reply with `responses`
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            template: MockProvider::new(responses),
            fail_models: Vec::new(),
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Factory whose providers fail every request
    pub fn failing(message: &str) -> Self {
        Self {
            template: MockProvider::failing(message),
            fail_models: Vec::new(),
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report `usage` with every response
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.template = self.template.with_usage(usage);
        self
    }

    /// Refuse to create a provider for `model`
    pub fn fail_for_model(mut self, model: &str) -> Self {
        self.fail_models.push(model.to_string());
        self
    }

    /// Models providers were created for, in order
    pub fn created_models(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    /// The shared provider script
    pub fn provider(&self) -> &MockProvider {
        &self.template
    }
}

impl ProviderFactory for MockProviderFactory {
    fn create(&self, model: &str) -> Result<Box<dyn Provider>> {
        if self.fail_models.iter().any(|m| m == model) {
            return Err(AskCsvError::MissingCredentials(format!("no provider for {}", model)).into());
        }
        self.created.lock().unwrap().push(model.to_string());
        Ok(Box::new(self.template.clone().with_model(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "content");
    }

    #[test]
    fn test_sample_frame_shape() {
        let frame = sample_frame();
        assert_eq!(frame.row_count(), 6);
        assert_eq!(frame.columns().len(), 5);
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_mock_provider_script() {
        let provider = MockProvider::new(vec![Message::assistant("one")]);
        let first = provider.complete(&[], &[]).await.unwrap();
        let second = provider.complete(&[], &[]).await.unwrap();
        assert_eq!(first.message.content.as_deref(), Some("one"));
        assert_eq!(second.message.content.as_deref(), Some("Done"));
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_mock_factory_records_models() {
        let factory = MockProviderFactory::new(vec![]).fail_for_model("gpt-4");
        assert!(factory.create("gpt-3.5-turbo").is_ok());
        assert!(factory.create("gpt-4").is_err());
        assert_eq!(factory.created_models(), vec!["gpt-3.5-turbo"]);
    }
}
