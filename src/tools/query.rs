//! filter_rows and sort_rows tools

use crate::dataset::{Condition, DataFrame};
use crate::error::Result;
use crate::tools::inspect::resolve_columns;
use crate::tools::{parse_params, ToolExecutor, ToolResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// JSON schema for a list of filter conditions, shared with aggregate tools
pub(crate) fn conditions_schema() -> serde_json::Value {
    json!({
        "type": "array",
        "description": "Conditions that must all hold",
        "items": {
            "type": "object",
            "properties": {
                "column": {"type": "string"},
                "op": {
                    "type": "string",
                    "enum": ["eq", "ne", "gt", "ge", "lt", "le", "contains", "starts_with", "is_empty", "not_empty"]
                },
                "value": {
                    "type": ["string", "number", "boolean"],
                    "description": "Comparison value; omit for is_empty/not_empty"
                }
            },
            "required": ["column", "op"]
        }
    })
}

/// Tool returning rows that match a conjunction of conditions
pub struct FilterRowsTool {
    frame: Arc<DataFrame>,
    max_rows: usize,
}

impl FilterRowsTool {
    /// Create the tool; `max_rows` caps how many matching rows are printed
    pub fn new(frame: Arc<DataFrame>, max_rows: usize) -> Self {
        Self { frame, max_rows }
    }
}

#[derive(Debug, Deserialize)]
struct FilterParams {
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default)]
    limit: Option<usize>,
}

#[async_trait::async_trait]
impl ToolExecutor for FilterRowsTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": "filter_rows",
            "description": "Return the rows of df matching all conditions, with the total match count. Numeric comparison is used when both sides are numbers; `contains` is case-insensitive.",
            "parameters": {
                "type": "object",
                "properties": {
                    "conditions": conditions_schema(),
                    "columns": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Columns to include in the output (default all)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum rows to print"
                    }
                },
                "required": ["conditions"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: FilterParams = match parse_params("filter_rows", args) {
            Ok(p) => p,
            Err(result) => return Ok(result),
        };
        let columns = match resolve_columns(&self.frame, params.columns.as_deref()) {
            Ok(c) => c,
            Err(result) => return Ok(result),
        };

        let rows = match self.frame.filter(&params.conditions) {
            Ok(rows) => rows,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        let limit = params.limit.unwrap_or(self.max_rows).min(self.max_rows);
        let table = self.frame.render_columns(&rows, &columns, limit);
        Ok(ToolResult::success(format!(
            "Matched {} of {} rows\n{}",
            rows.len(),
            self.frame.row_count(),
            table
        )))
    }
}

/// Tool returning the top rows ordered by a column
pub struct SortRowsTool {
    frame: Arc<DataFrame>,
    max_rows: usize,
}

impl SortRowsTool {
    /// Create the tool; `max_rows` caps how many rows are printed
    pub fn new(frame: Arc<DataFrame>, max_rows: usize) -> Self {
        Self { frame, max_rows }
    }
}

#[derive(Debug, Deserialize)]
struct SortParams {
    column: String,
    #[serde(default)]
    descending: bool,
    #[serde(default = "default_sort_limit")]
    limit: usize,
    #[serde(default)]
    columns: Option<Vec<String>>,
}

fn default_sort_limit() -> usize {
    10
}

#[async_trait::async_trait]
impl ToolExecutor for SortRowsTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": "sort_rows",
            "description": "Sort df by a column (numeric-aware, empty values last) and return the first rows. Use for top-N / bottom-N questions.",
            "parameters": {
                "type": "object",
                "properties": {
                    "column": {"type": "string", "description": "Column to sort by"},
                    "descending": {"type": "boolean", "description": "Sort largest first (default false)"},
                    "limit": {"type": "integer", "description": "Rows to return (default 10)"},
                    "columns": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Columns to include in the output (default all)"
                    }
                },
                "required": ["column"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: SortParams = match parse_params("sort_rows", args) {
            Ok(p) => p,
            Err(result) => return Ok(result),
        };
        let columns = match resolve_columns(&self.frame, params.columns.as_deref()) {
            Ok(c) => c,
            Err(result) => return Ok(result),
        };

        let mut rows = match self.frame.sort_by(&params.column, params.descending) {
            Ok(rows) => rows,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };
        rows.truncate(params.limit.min(self.max_rows));

        Ok(ToolResult::success(self.frame.render_columns(
            &rows,
            &columns,
            rows.len(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_frame;

    #[tokio::test]
    async fn test_filter_rows_with_conditions() {
        let tool = FilterRowsTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({
                "conditions": [
                    {"column": "city", "op": "eq", "value": "Austin"},
                    {"column": "price", "op": "gt", "value": 130}
                ],
                "columns": ["name", "price"]
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("Matched 2 of 6 rows"));
        assert!(result.output.contains("| Villa | 310 |"));
        assert!(result.output.contains("| Bungalow | 150 |"));
    }

    #[tokio::test]
    async fn test_filter_rows_limit() {
        let tool = FilterRowsTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({"conditions": [], "limit": 2}))
            .await
            .unwrap();
        assert!(result.output.starts_with("Matched 6 of 6 rows"));
        assert!(result.output.contains("... (4 more rows)"));
    }

    #[tokio::test]
    async fn test_filter_rows_unknown_column_is_tool_error() {
        let tool = FilterRowsTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({"conditions": [{"column": "zip", "op": "eq", "value": "1"}]}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.to_message().contains("Unknown column 'zip'"));
    }

    #[tokio::test]
    async fn test_filter_rows_bad_operator_is_tool_error() {
        let tool = FilterRowsTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({"conditions": [{"column": "price", "op": "between", "value": "1"}]}))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_sort_rows_descending_limit() {
        let tool = SortRowsTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({"column": "price", "descending": true, "limit": 2, "columns": ["name"]}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "| name |\n| Villa |\n| Bungalow |\n[2 rows]");
    }

    #[tokio::test]
    async fn test_sort_rows_missing_column_argument() {
        let tool = SortRowsTool::new(Arc::new(sample_frame()), 50);
        let result = tool.execute(json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.to_message().contains("Invalid arguments for sort_rows"));
    }
}
