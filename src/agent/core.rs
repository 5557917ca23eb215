//! Agent core implementation with the tool-calling loop
//!
//! This module implements the loop that answers one question:
//! - Sends the instruction prefix and the question to the provider
//! - Executes table tool calls requested by the provider
//! - Enforces iteration limits and timeouts
//! - Accumulates token usage over every provider request

use crate::config::AgentConfig;
use crate::error::{AskCsvError, Result};
use crate::providers::{Provider, TokenUsage, ToolCall};
use crate::tools::{ToolRegistry, ToolResult};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::Conversation;

/// Result of answering one question
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Final answer text from the model
    pub answer: String,
    /// Token usage summed over all provider requests
    pub usage: TokenUsage,
    /// Number of successful provider requests
    pub requests: usize,
    /// Number of tool calls executed
    pub tool_calls: usize,
    /// Model identifier that produced the answer
    pub model: String,
}

/// Agent answering questions about one dataset with one model
///
/// The instruction prefix is fixed at construction; every call to
/// [`Agent::run`] starts a fresh conversation from it.
///
/// # Examples
///
/// ```ignore
/// use askcsv::agent::Agent;
/// use askcsv::config::AgentConfig;
/// use askcsv::tools::ToolRegistry;
///
/// # async fn example() -> askcsv::error::Result<()> {
/// # let provider = unimplemented!();
/// let agent = Agent::new(provider, ToolRegistry::new(), AgentConfig::default(), "prefix")?;
/// let outcome = agent.run("How many rows are there?").await?;
/// println!("{}", outcome.answer);
/// # Ok(())
/// # }
/// ```
pub struct Agent {
    provider: Box<dyn Provider>,
    tools: ToolRegistry,
    config: AgentConfig,
    prefix: String,
    model: String,
}

impl Agent {
    /// Creates a new agent instance
    ///
    /// # Arguments
    ///
    /// * `provider` - The provider bound to the tier's model
    /// * `tools` - The table tools available to the model
    /// * `config` - Agent configuration (limits, timeouts, tool output size)
    /// * `prefix` - Instruction prefix sent as the system message
    ///
    /// # Errors
    ///
    /// Returns `AskCsvError::Config` if `max_turns` is zero
    pub fn new(
        provider: Box<dyn Provider>,
        tools: ToolRegistry,
        config: AgentConfig,
        prefix: impl Into<String>,
    ) -> Result<Self> {
        if config.max_turns == 0 {
            return Err(
                AskCsvError::Config("max_turns must be greater than 0".to_string()).into(),
            );
        }

        let model = provider
            .get_current_model()
            .unwrap_or_else(|_| "unknown".to_string());
        debug!("Agent created for model {} with {} tools", model, tools.len());

        Ok(Self {
            provider,
            tools,
            config,
            prefix: prefix.into(),
            model,
        })
    }

    /// Answers one question
    ///
    /// # Errors
    ///
    /// - `AskCsvError::MaxIterationsExceeded` if the model keeps calling tools
    /// - `AskCsvError::Timeout` if the run exceeds `timeout_seconds`
    /// - `AskCsvError::Provider` (and friends) if a provider call fails
    pub async fn run(&self, question: &str) -> Result<QueryOutcome> {
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        match tokio::time::timeout(timeout, self.run_loop(question)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Agent execution timeout after {} seconds",
                    self.config.timeout_seconds
                );
                Err(AskCsvError::Timeout(self.config.timeout_seconds).into())
            }
        }
    }

    async fn run_loop(&self, question: &str) -> Result<QueryOutcome> {
        let start_time = Instant::now();
        info!(model = %self.model, "Starting agent execution");

        let mut conversation = Conversation::with_system_prompt(self.prefix.clone());
        conversation.add_user_message(question);
        let tool_definitions = self.tools.all_definitions();

        let mut tool_calls_executed = 0;
        let mut iteration = 0;

        let answer = loop {
            iteration += 1;

            if iteration > self.config.max_turns {
                warn!("Maximum iterations ({}) exceeded", self.config.max_turns);
                return Err(AskCsvError::MaxIterationsExceeded {
                    limit: self.config.max_turns,
                    message: format!(
                        "no final answer after {} provider requests",
                        self.config.max_turns
                    ),
                }
                .into());
            }

            debug!("Iteration {}/{}", iteration, self.config.max_turns);

            let response = self
                .provider
                .complete(conversation.messages(), &tool_definitions)
                .await?;
            conversation.record_request(response.usage);

            let message = response.message;
            match message.tool_calls {
                Some(tool_calls) if !tool_calls.is_empty() => {
                    debug!("Executing {} tool calls", tool_calls.len());
                    conversation.add_assistant_tool_calls(message.content, tool_calls.clone());
                    for tool_call in &tool_calls {
                        let result = self.execute_tool_call(tool_call).await;
                        conversation.add_tool_result(&tool_call.id, result.to_message());
                        tool_calls_executed += 1;
                    }
                }
                _ => match message.content {
                    Some(content) => {
                        conversation.add_assistant_message(content.clone());
                        break content;
                    }
                    None => {
                        warn!("Provider returned neither content nor tool calls");
                        return Err(AskCsvError::Provider(
                            "Provider returned invalid response (no content or tool calls)"
                                .to_string(),
                        )
                        .into());
                    }
                },
            }
        };

        let usage = conversation.usage();
        info!(
            model = %self.model,
            iterations = iteration,
            tool_calls = tool_calls_executed,
            total_tokens = usage.total_tokens,
            "Agent execution completed in {} ms",
            start_time.elapsed().as_millis()
        );

        Ok(QueryOutcome {
            answer,
            usage,
            requests: conversation.requests(),
            tool_calls: tool_calls_executed,
            model: self.model.clone(),
        })
    }

    /// Executes a single tool call
    ///
    /// Every failure becomes an error result the model can read and react
    /// to; nothing here aborts the run.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolResult {
        let tool_name = &tool_call.function.name;
        debug!("Executing tool: {}", tool_name);

        let Some(tool_executor) = self.tools.get(tool_name) else {
            warn!("Model requested unknown tool: {}", tool_name);
            return ToolResult::error(format!(
                "Tool not found: {}. Available tools: {}",
                tool_name,
                self.tools.names().join(", ")
            ));
        };

        let raw = tool_call.function.arguments.trim();
        let args: serde_json::Value = if raw.is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(raw) {
                Ok(args) => args,
                Err(e) => {
                    return ToolResult::error(format!(
                        "Failed to parse tool arguments for '{}': {}",
                        tool_name, e
                    ))
                }
            }
        };

        let result = match tool_executor.execute(args).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool '{}' execution failed: {}", tool_name, e);
                ToolResult::error(format!("Tool '{}' execution failed: {}", tool_name, e))
            }
        };

        let max_output_size = self.config.tools.max_output_size;
        let original_len = result.output.len();
        let result = result.truncate_if_needed(max_output_size);
        if result.truncated {
            debug!(
                "Tool output truncated from {} to {} bytes",
                original_len, max_output_size
            );
        }
        result
    }

    /// Model identifier the agent talks to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The instruction prefix sent with every question
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the number of registered tools
    pub fn num_tools(&self) -> usize {
        self.tools.len()
    }
}
