//! Tools module for askcsv
//!
//! This module contains the tool abstraction, the tool registry, and the
//! table tools the agent uses to inspect and query the dataset.

pub mod aggregate;
pub mod inspect;
pub mod query;
pub mod registry_builder;

pub use aggregate::{AggregateColumnTool, GroupByTool, ValueCountsTool};
pub use inspect::{DescribeTableTool, PreviewRowsTool};
pub use query::{FilterRowsTool, SortRowsTool};
pub use registry_builder::ToolRegistryBuilder;

use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool result structure
///
/// Represents the result of a tool execution with truncation support.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Error message if execution failed
    pub error: Option<String>,
    /// Whether the output was truncated
    pub truncated: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
            truncated: false,
        }
    }

    /// Create a failed tool result
    pub fn error(error: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error),
            truncated: false,
        }
    }

    /// Truncate output if it exceeds the maximum size
    ///
    /// The cut is moved back to the nearest UTF-8 character boundary.
    ///
    /// # Arguments
    ///
    /// * `max_size` - Maximum size in bytes
    ///
    /// # Returns
    ///
    /// Returns self with potentially truncated output
    pub fn truncate_if_needed(mut self, max_size: usize) -> Self {
        if self.output.len() > max_size {
            let mut cut = max_size;
            while cut > 0 && !self.output.is_char_boundary(cut) {
                cut -= 1;
            }
            self.output.truncate(cut);
            self.output.push_str("\n... (truncated)");
            self.truncated = true;
        }
        self
    }

    /// Convert to a message string for the conversation
    pub fn to_message(&self) -> String {
        if self.success {
            if self.truncated {
                format!("{}\n(Output truncated to fit context window)", self.output)
            } else {
                self.output.clone()
            }
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

/// Parse tool arguments, turning a schema mismatch into an error result
///
/// The model sees the error and can retry with corrected arguments.
pub(crate) fn parse_params<T: DeserializeOwned>(
    tool: &str,
    args: serde_json::Value,
) -> std::result::Result<T, ToolResult> {
    // Models sometimes send `null` instead of `{}` for tools without parameters
    let args = if args.is_null() {
        serde_json::json!({})
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| ToolResult::error(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```no_run
/// use askcsv::tools::{ToolExecutor, ToolResult};
/// use askcsv::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct RowCount(usize);
///
/// #[async_trait]
/// impl ToolExecutor for RowCount {
///     fn tool_definition(&self) -> Value {
///         serde_json::json!({
///             "name": "row_count",
///             "description": "Number of rows in df",
///             "parameters": {"type": "object", "properties": {}}
///         })
///     }
///
///     async fn execute(&self, _args: Value) -> Result<ToolResult> {
///         Ok(ToolResult::success(self.0.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool definition (`name`, `description`, `parameters`)
    fn tool_definition(&self) -> serde_json::Value;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns error only for failures outside the tool's own domain;
    /// bad arguments are reported through an error `ToolResult`
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult>;
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool executor in the registry
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        self.tools.insert(name.into(), executor);
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// All tool definitions, ordered by tool name
    pub fn all_definitions(&self) -> Vec<serde_json::Value> {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|executor| executor.tool_definition())
            .collect()
    }

    /// Registered tool names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
