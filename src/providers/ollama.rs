//! Ollama provider implementation for askcsv
//!
//! Connects to a local or remote Ollama server through `/api/chat` with tool
//! calling support. Token usage comes from `prompt_eval_count` and
//! `eval_count`.

use crate::config::OllamaConfig;
use crate::error::{AskCsvError, Result};
use crate::providers::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, ModelInfo, Provider,
    TokenUsage, ToolCall,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```
/// use askcsv::config::OllamaConfig;
/// use askcsv::providers::OllamaProvider;
///
/// let provider = OllamaProvider::new(&OllamaConfig::default(), "llama3.2:latest").unwrap();
/// assert_eq!(provider.host(), "http://localhost:11434");
/// ```
pub struct OllamaProvider {
    client: Client,
    host: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    r#type: String,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Ollama sends arguments as a JSON object, not a string
#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider for a model
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &OllamaConfig, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .user_agent(concat!("askcsv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AskCsvError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            model
        );

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Configured Ollama host
    pub fn host(&self) -> &str {
        &self.host
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        validate_message_sequence(messages)
            .into_iter()
            .filter(|m| m.content.is_some() || m.tool_calls.is_some())
            .map(|m| OllamaMessage {
                role: m.role,
                content: m.content.unwrap_or_default(),
                tool_calls: m.tool_calls.map(|calls| {
                    calls
                        .into_iter()
                        .map(|tc| OllamaToolCall {
                            function: OllamaFunctionCall {
                                name: tc.function.name,
                                arguments: serde_json::from_str(&tc.function.arguments)
                                    .unwrap_or_else(|_| serde_json::json!({})),
                            },
                        })
                        .collect()
                }),
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[serde_json::Value]) -> Vec<OllamaTool> {
        tools
            .iter()
            .filter_map(|t| {
                let obj = t.as_object()?;
                Some(OllamaTool {
                    r#type: "function".to_string(),
                    function: OllamaFunction {
                        name: obj.get("name")?.as_str()?.to_string(),
                        description: obj.get("description")?.as_str()?.to_string(),
                        parameters: obj.get("parameters")?.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_response_message(&self, message: OllamaMessage) -> Message {
        match message.tool_calls {
            Some(calls) if !calls.is_empty() => Message::assistant_with_tools(
                calls
                    .into_iter()
                    .map(|tc| ToolCall {
                        // Ollama does not assign call ids
                        id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                        function: FunctionCall {
                            name: tc.function.name,
                            arguments: tc.function.arguments.to_string(),
                        },
                    })
                    .collect(),
            ),
            _ => Message::assistant(message.content),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let request = OllamaRequest {
            model: self.model.clone(),
            messages: self.convert_messages(messages),
            tools: self.convert_tools(tools),
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        };

        tracing::debug!(
            "Sending Ollama request: {} messages, {} tools",
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                AskCsvError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(AskCsvError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            AskCsvError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        let message = self.convert_response_message(ollama_response.message);
        let response = if ollama_response.prompt_eval_count > 0 || ollama_response.eval_count > 0 {
            CompletionResponse::with_usage(
                message,
                TokenUsage::new(ollama_response.prompt_eval_count, ollama_response.eval_count),
            )
        } else {
            CompletionResponse::new(message)
        };
        Ok(response)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        tracing::debug!("Listing Ollama models from {}", self.host);
        let response = self
            .client
            .get(format!("{}/api/tags", self.host))
            .send()
            .await
            .map_err(|e| AskCsvError::Provider(format!("Failed to list Ollama models: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AskCsvError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            AskCsvError::Provider(format!("Failed to parse Ollama tags response: {}", e))
        })?;

        Ok(tags
            .models
            .into_iter()
            .map(|tag| ModelInfo {
                name: tag.name,
                owned_by: None,
                size_bytes: Some(tag.size),
            })
            .collect())
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.model.clone())
    }

    async fn set_model(&mut self, model_name: String) -> Result<()> {
        let available = self.list_models().await?;
        if !available.iter().any(|m| m.name == model_name) {
            let names: Vec<String> = available.into_iter().map(|m| m.name).collect();
            return Err(AskCsvError::Provider(format!(
                "Model '{}' not found. Available models: {}",
                model_name,
                names.join(", ")
            ))
            .into());
        }
        self.model = model_name;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OllamaProvider {
        OllamaProvider::new(&OllamaConfig::default(), "llama3.2:latest").unwrap()
    }

    #[test]
    fn test_ollama_provider_model() {
        assert_eq!(provider().get_current_model().unwrap(), "llama3.2:latest");
    }

    #[test]
    fn test_convert_messages_parses_arguments_to_objects() {
        let messages = vec![
            Message::user("Top cities?"),
            Message::assistant_with_tools(vec![ToolCall {
                id: "call_1".to_string(),
                function: FunctionCall {
                    name: "value_counts".to_string(),
                    arguments: r#"{"column":"city"}"#.to_string(),
                },
            }]),
            Message::tool_result("call_1", "Austin: 2"),
        ];
        let converted = provider().convert_messages(&messages);
        assert_eq!(converted.len(), 3);
        let calls = converted[1].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments["column"], "city");
        assert_eq!(converted[1].content, "");
    }

    #[test]
    fn test_convert_response_message_assigns_ids() {
        let message = OllamaMessage {
            role: "assistant".to_string(),
            content: String::new(),
            tool_calls: Some(vec![OllamaToolCall {
                function: OllamaFunctionCall {
                    name: "describe_table".to_string(),
                    arguments: serde_json::json!({}),
                },
            }]),
        };
        let converted = provider().convert_response_message(message);
        let calls = converted.tool_calls.unwrap();
        assert!(calls[0].id.starts_with("call_"));
        assert_eq!(calls[0].function.arguments, "{}");
    }

    #[test]
    fn test_response_usage_fields() {
        let body = r#"{
            "message": {"role": "assistant", "content": "42"},
            "done": true,
            "prompt_eval_count": 300,
            "eval_count": 12
        }"#;
        let parsed: OllamaResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.prompt_eval_count, 300);
        assert_eq!(parsed.eval_count, 12);
        assert_eq!(parsed.message.content, "42");
    }
}
