//! OpenAI-compatible chat completions provider
//!
//! Talks to `{api_base}/chat/completions` with bearer authentication. Works
//! against api.openai.com and any server exposing the same wire format.

use crate::config::OpenAiConfig;
use crate::error::{AskCsvError, Result};
use crate::providers::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, ModelInfo, Provider,
    TokenUsage, ToolCall,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible API provider
///
/// # Examples
///
/// ```no_run
/// use askcsv::config::OpenAiConfig;
/// use askcsv::providers::{Message, OpenAiProvider, Provider};
///
/// # async fn example() -> askcsv::error::Result<()> {
/// let provider = OpenAiProvider::new(&OpenAiConfig::default(), "gpt-3.5-turbo")?;
/// let completion = provider.complete(&[Message::user("Hello!")], &[]).await?;
/// println!("{:?}", completion.message.content);
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    temperature: f32,
}

/// Message in OpenAI wire format
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    r#type: String,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(default = "default_tool_type")]
    r#type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn default_tool_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Response from `GET /models`
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    owned_by: Option<String>,
}

fn format_api_error(status: reqwest::StatusCode, body: &str) -> AskCsvError {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        AskCsvError::Authentication(format!(
            "OpenAI returned error {}: {}. Check the configured API key",
            status, body
        ))
    } else {
        AskCsvError::Provider(format!("OpenAI returned error {}: {}", status, body))
    }
}

impl OpenAiProvider {
    /// Create a provider reading the API key from the configured env var
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if the key is unset or blank, or an error
    /// if the HTTP client cannot be built
    pub fn new(config: &OpenAiConfig, model: &str) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AskCsvError::MissingCredentials(format!(
                    "openai (set {} in the environment or .env)",
                    config.api_key_env
                ))
            })?;
        Self::with_api_key(config, model, api_key)
    }

    /// Create a provider with an explicit API key
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn with_api_key(
        config: &OpenAiConfig,
        model: &str,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("askcsv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AskCsvError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            model
        );

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.to_string(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<ChatMessage> {
        validate_message_sequence(messages)
            .into_iter()
            .filter(|m| m.content.is_some() || m.tool_calls.is_some())
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content,
                tool_calls: m.tool_calls.map(|calls| {
                    calls
                        .into_iter()
                        .map(|tc| ChatToolCall {
                            id: tc.id,
                            r#type: "function".to_string(),
                            function: ChatFunctionCall {
                                name: tc.function.name,
                                arguments: tc.function.arguments,
                            },
                        })
                        .collect()
                }),
                tool_call_id: m.tool_call_id,
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[serde_json::Value]) -> Vec<ChatTool> {
        tools
            .iter()
            .filter_map(|t| {
                let obj = t.as_object()?;
                Some(ChatTool {
                    r#type: "function".to_string(),
                    function: ChatFunction {
                        name: obj.get("name")?.as_str()?.to_string(),
                        description: obj.get("description")?.as_str()?.to_string(),
                        parameters: obj.get("parameters")?.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_response_message(&self, message: ChatMessage) -> Message {
        match message.tool_calls {
            Some(calls) if !calls.is_empty() => Message::assistant_with_tools(
                calls
                    .into_iter()
                    .map(|tc| ToolCall {
                        id: tc.id,
                        function: FunctionCall {
                            name: tc.function.name,
                            arguments: tc.function.arguments,
                        },
                    })
                    .collect(),
            ),
            _ => Message {
                role: "assistant".to_string(),
                content: message.content,
                tool_calls: None,
                tool_call_id: None,
            },
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.convert_messages(messages),
            tools: self.convert_tools(tools),
            temperature: self.temperature,
        };

        tracing::debug!(
            "Sending OpenAI request: model={}, {} messages, {} tools",
            request.model,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI request failed: {}", e);
                AskCsvError::Provider(format!("OpenAI request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(format_api_error(status, &error_text).into());
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}", e);
            AskCsvError::Provider(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AskCsvError::Provider("No choices in OpenAI response".to_string()))?;

        tracing::debug!(
            "OpenAI response received: finish_reason={}",
            choice.finish_reason.as_deref().unwrap_or("unknown")
        );

        let message = self.convert_response_message(choice.message);
        let response = match chat_response.usage {
            Some(u) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(u.prompt_tokens, u.completion_tokens),
            ),
            None => CompletionResponse::new(message),
        };
        Ok(response)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        tracing::debug!("Listing OpenAI models");
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AskCsvError::Provider(format!("Failed to list models: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format_api_error(status, &error_text).into());
        }

        let body: ModelsResponse = response.json().await.map_err(|e| {
            AskCsvError::Provider(format!("Failed to parse models response: {}", e))
        })?;

        let mut models: Vec<ModelInfo> = body
            .data
            .into_iter()
            .map(|entry| ModelInfo {
                name: entry.id,
                owned_by: entry.owned_by,
                size_bytes: None,
            })
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.model.clone())
    }

    async fn set_model(&mut self, model_name: String) -> Result<()> {
        if model_name.trim().is_empty() {
            return Err(AskCsvError::Provider("Model name cannot be empty".to_string()).into());
        }
        self.model = model_name;
        Ok(())
    }
}
