//! describe_table and preview_rows tools
//!
//! Give the model a view of the table's shape and a sample of its rows.

use crate::dataset::ops::format_number;
use crate::dataset::DataFrame;
use crate::error::Result;
use crate::tools::{parse_params, ToolExecutor, ToolResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Tool summarizing every column of the table
pub struct DescribeTableTool {
    frame: Arc<DataFrame>,
}

impl DescribeTableTool {
    /// Create the tool over a shared frame
    pub fn new(frame: Arc<DataFrame>) -> Self {
        Self { frame }
    }
}

#[derive(Debug, Deserialize)]
struct DescribeParams {}

#[async_trait::async_trait]
impl ToolExecutor for DescribeTableTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": "describe_table",
            "description": "Describe df: row count, and for each column its type, non-empty count, distinct values, and min/max/mean for numeric columns.",
            "parameters": {
                "type": "object",
                "properties": {}
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        if let Err(result) = parse_params::<DescribeParams>("describe_table", args) {
            return Ok(result);
        }

        let mut out = format!(
            "df has {} rows and {} columns\n",
            self.frame.row_count(),
            self.frame.columns().len()
        );
        for summary in self.frame.describe() {
            out.push_str(&format!(
                "- {} ({}): non_empty={}, unique={}",
                summary.name, summary.column_type, summary.non_empty, summary.unique
            ));
            if let (Some(min), Some(max), Some(mean)) = (summary.min, summary.max, summary.mean) {
                out.push_str(&format!(
                    ", min={}, max={}, mean={}",
                    format_number(min),
                    format_number(max),
                    format_number(mean)
                ));
            }
            out.push('\n');
        }
        Ok(ToolResult::success(out))
    }
}

/// Tool printing a window of rows
pub struct PreviewRowsTool {
    frame: Arc<DataFrame>,
    max_rows: usize,
}

impl PreviewRowsTool {
    /// Create the tool; `max_rows` caps how many rows one call may print
    pub fn new(frame: Arc<DataFrame>, max_rows: usize) -> Self {
        Self { frame, max_rows }
    }
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    #[serde(default = "default_preview")]
    n: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    columns: Option<Vec<String>>,
}

fn default_preview() -> usize {
    5
}

/// Resolve an optional column projection to indices
pub(crate) fn resolve_columns(
    frame: &DataFrame,
    columns: Option<&[String]>,
) -> std::result::Result<Vec<usize>, ToolResult> {
    match columns {
        None => Ok((0..frame.columns().len()).collect()),
        Some(names) if names.is_empty() => Ok((0..frame.columns().len()).collect()),
        Some(names) => names
            .iter()
            .map(|name| {
                frame
                    .column_index(name)
                    .map_err(|e| ToolResult::error(e.to_string()))
            })
            .collect(),
    }
}

#[async_trait::async_trait]
impl ToolExecutor for PreviewRowsTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": "preview_rows",
            "description": "Show rows of df as a table, starting at `offset`. Optionally restrict to some columns.",
            "parameters": {
                "type": "object",
                "properties": {
                    "n": {
                        "type": "integer",
                        "description": "Number of rows to show (default 5)"
                    },
                    "offset": {
                        "type": "integer",
                        "description": "Index of the first row to show (default 0)"
                    },
                    "columns": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Columns to include (default all)"
                    }
                }
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: PreviewParams = match parse_params("preview_rows", args) {
            Ok(p) => p,
            Err(result) => return Ok(result),
        };
        let columns = match resolve_columns(&self.frame, params.columns.as_deref()) {
            Ok(c) => c,
            Err(result) => return Ok(result),
        };

        let n = params.n.min(self.max_rows);
        let start = params.offset.min(self.frame.row_count());
        let end = start.saturating_add(n).min(self.frame.row_count());
        let rows: Vec<usize> = (start..end).collect();

        Ok(ToolResult::success(self.frame.render_columns(
            &rows, &columns, n,
        )))
    }
}
