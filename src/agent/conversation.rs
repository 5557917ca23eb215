//! Conversation state for a single question
//!
//! Each question starts from a conversation holding only the instruction
//! prefix; the agent appends the question, assistant turns and tool results
//! as the run progresses.

use crate::providers::{Message, TokenUsage, ToolCall};

/// Ordered messages exchanged with the provider during one agent run
///
/// Also accumulates the token usage reported by the provider across all
/// requests of the run.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    usage: TokenUsage,
    requests: usize,
}

impl Conversation {
    /// Creates an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a conversation starting with a system message
    ///
    /// # Examples
    ///
    /// ```
    /// use askcsv::agent::Conversation;
    ///
    /// let conversation = Conversation::with_system_prompt("You are working with df.");
    /// assert_eq!(conversation.len(), 1);
    /// assert_eq!(conversation.messages()[0].role, "system");
    /// ```
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.add_system_message(prompt);
        conversation
    }

    /// Adds a system message
    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    /// Adds a user message
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Adds a plain assistant message
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Adds an assistant message that requests tool calls
    ///
    /// Any text the model sent alongside the calls is kept on the same
    /// message so tool results stay attached to it.
    pub fn add_assistant_tool_calls(&mut self, content: Option<String>, tool_calls: Vec<ToolCall>) {
        let mut message = Message::assistant_with_tools(tool_calls);
        message.content = content.filter(|c| !c.trim().is_empty());
        self.messages.push(message);
    }

    /// Adds the result of a tool call
    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, content: impl Into<String>) {
        self.messages.push(Message::tool_result(tool_call_id, content));
    }

    /// Records usage reported for one provider request
    ///
    /// Providers that report no usage still count as a request.
    pub fn record_request(&mut self, usage: Option<TokenUsage>) {
        self.requests += 1;
        if let Some(usage) = usage {
            self.usage += usage;
        }
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Token usage accumulated over the run
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Number of completed provider requests
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
