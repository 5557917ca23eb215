//! aggregate_column, group_by and value_counts tools

use crate::dataset::{AggFunc, Condition, DataFrame};
use crate::error::Result;
use crate::tools::query::conditions_schema;
use crate::tools::{parse_params, ToolExecutor, ToolResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const AGG_FUNCS: [&str; 7] = ["count", "sum", "mean", "min", "max", "nunique", "median"];

/// Tool computing one aggregate over a column, optionally on filtered rows
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use askcsv::dataset::DataFrame;
/// use askcsv::tools::{AggregateColumnTool, ToolExecutor};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let df = DataFrame::from_reader("city,price\nAustin,100\nDenver,50\n".as_bytes()).unwrap();
/// let tool = AggregateColumnTool::new(Arc::new(df));
/// let result = tool
///     .execute(json!({"column": "price", "func": "sum"}))
///     .await
///     .unwrap();
/// assert_eq!(result.output, "sum(price) = 150 over 2 rows");
/// # });
/// ```
pub struct AggregateColumnTool {
    frame: Arc<DataFrame>,
}

impl AggregateColumnTool {
    /// Create the tool over a shared frame
    pub fn new(frame: Arc<DataFrame>) -> Self {
        Self { frame }
    }
}

#[derive(Debug, Deserialize)]
struct AggregateParams {
    column: String,
    func: AggFunc,
    #[serde(default)]
    conditions: Vec<Condition>,
}

#[async_trait::async_trait]
impl ToolExecutor for AggregateColumnTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": "aggregate_column",
            "description": "Compute count, sum, mean, min, max, nunique or median of a column of df. Numeric functions skip empty and non-numeric cells. Optional conditions restrict the rows first.",
            "parameters": {
                "type": "object",
                "properties": {
                    "column": {"type": "string"},
                    "func": {"type": "string", "enum": AGG_FUNCS},
                    "conditions": conditions_schema()
                },
                "required": ["column", "func"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: AggregateParams = match parse_params("aggregate_column", args) {
            Ok(p) => p,
            Err(result) => return Ok(result),
        };

        let outcome = self.frame.column_index(&params.column).and_then(|col| {
            let rows = self.frame.filter(&params.conditions)?;
            let value = self.frame.aggregate_rows(col, params.func, &rows)?;
            Ok((rows.len(), value))
        });

        match outcome {
            Ok((rows, value)) => Ok(ToolResult::success(format!(
                "{}({}) = {} over {} rows",
                params.func, params.column, value, rows
            ))),
            Err(e) => Ok(ToolResult::error(e.to_string())),
        }
    }
}

/// Tool aggregating a column per group
pub struct GroupByTool {
    frame: Arc<DataFrame>,
    max_rows: usize,
}

impl GroupByTool {
    /// Create the tool; `max_rows` caps how many groups are printed
    pub fn new(frame: Arc<DataFrame>, max_rows: usize) -> Self {
        Self { frame, max_rows }
    }
}

#[derive(Debug, Deserialize)]
struct GroupByParams {
    by: String,
    column: String,
    func: AggFunc,
    #[serde(default)]
    sort_by_value: bool,
    #[serde(default)]
    limit: Option<usize>,
}

#[async_trait::async_trait]
impl ToolExecutor for GroupByTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": "group_by",
            "description": "Group df by one column and aggregate another column per group. Groups are sorted by key, or by value (largest first) when sort_by_value is true.",
            "parameters": {
                "type": "object",
                "properties": {
                    "by": {"type": "string", "description": "Column to group by"},
                    "column": {"type": "string", "description": "Column to aggregate"},
                    "func": {"type": "string", "enum": AGG_FUNCS},
                    "sort_by_value": {"type": "boolean"},
                    "limit": {"type": "integer", "description": "Maximum groups to return"}
                },
                "required": ["by", "column", "func"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: GroupByParams = match parse_params("group_by", args) {
            Ok(p) => p,
            Err(result) => return Ok(result),
        };

        let mut groups = match self.frame.group_by(&params.by, &params.column, params.func) {
            Ok(groups) => groups,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };
        if params.sort_by_value {
            groups.sort_by(|a, b| {
                b.1.as_f64()
                    .partial_cmp(&a.1.as_f64())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let total = groups.len();
        let limit = params.limit.unwrap_or(self.max_rows).min(self.max_rows);
        let mut out = format!("| {} | {}({}) |\n", params.by, params.func, params.column);
        for (key, value) in groups.iter().take(limit) {
            out.push_str(&format!("| {} | {} |\n", key, value));
        }
        if total > limit {
            out.push_str(&format!("... ({} more groups)\n", total - limit));
        }
        out.push_str(&format!("[{} groups]", total));
        Ok(ToolResult::success(out))
    }
}

/// Tool listing the most frequent values of a column
pub struct ValueCountsTool {
    frame: Arc<DataFrame>,
    max_rows: usize,
}

impl ValueCountsTool {
    /// Create the tool; `max_rows` caps how many values are printed
    pub fn new(frame: Arc<DataFrame>, max_rows: usize) -> Self {
        Self { frame, max_rows }
    }
}

#[derive(Debug, Deserialize)]
struct ValueCountsParams {
    column: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[async_trait::async_trait]
impl ToolExecutor for ValueCountsTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": "value_counts",
            "description": "Count how often each non-empty value occurs in a column of df, most frequent first.",
            "parameters": {
                "type": "object",
                "properties": {
                    "column": {"type": "string"},
                    "limit": {"type": "integer", "description": "Maximum values to return"}
                },
                "required": ["column"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: ValueCountsParams = match parse_params("value_counts", args) {
            Ok(p) => p,
            Err(result) => return Ok(result),
        };
        let limit = params.limit.unwrap_or(self.max_rows).min(self.max_rows);

        let counts = match self.frame.value_counts(&params.column, None) {
            Ok(counts) => counts,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        let distinct = counts.len();
        let mut out = String::new();
        for (value, count) in counts.iter().take(limit) {
            out.push_str(&format!("{}: {}\n", value, count));
        }
        if distinct > limit {
            out.push_str(&format!("... ({} more values)\n", distinct - limit));
        }
        out.push_str(&format!("[{} distinct values]", distinct));
        Ok(ToolResult::success(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_frame;

    #[tokio::test]
    async fn test_aggregate_column_mean() {
        let tool = AggregateColumnTool::new(Arc::new(sample_frame()));
        let result = tool
            .execute(json!({"column": "rooms", "func": "mean"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "mean(rooms) = 2.1667 over 6 rows");
    }

    #[tokio::test]
    async fn test_aggregate_column_with_conditions() {
        let tool = AggregateColumnTool::new(Arc::new(sample_frame()));
        let result = tool
            .execute(json!({
                "column": "price",
                "func": "sum",
                "conditions": [{"column": "city", "op": "eq", "value": "Denver"}]
            }))
            .await
            .unwrap();
        assert_eq!(result.output, "sum(price) = 175 over 2 rows");
    }

    #[tokio::test]
    async fn test_aggregate_column_alias_and_errors() {
        let tool = AggregateColumnTool::new(Arc::new(sample_frame()));
        let result = tool
            .execute(json!({"column": "price", "func": "avg"}))
            .await
            .unwrap();
        assert!(result.success);

        let result = tool
            .execute(json!({"column": "city", "func": "sum"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.to_message().contains("no numeric values"));

        let result = tool
            .execute(json!({"column": "price", "func": "mode"}))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_group_by_sorted_by_value() {
        let tool = GroupByTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({"by": "city", "column": "name", "func": "count", "sort_by_value": true}))
            .await
            .unwrap();
        assert!(result.success);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines[0], "| city | count(name) |");
        assert_eq!(lines[1], "| Austin | 3 |");
        assert_eq!(lines[2], "| Denver | 2 |");
        assert_eq!(lines.last().copied(), Some("[3 groups]"));
    }

    #[tokio::test]
    async fn test_group_by_limit() {
        let tool = GroupByTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({"by": "city", "column": "price", "func": "max", "limit": 1}))
            .await
            .unwrap();
        assert!(result.output.contains("| Austin | 310 |"));
        assert!(result.output.contains("... (1 more groups)"));
    }

    #[tokio::test]
    async fn test_value_counts() {
        let tool = ValueCountsTool::new(Arc::new(sample_frame()), 50);
        let result = tool
            .execute(json!({"column": "city", "limit": 2}))
            .await
            .unwrap();
        assert_eq!(
            result.output,
            "Austin: 3\nDenver: 2\n... (1 more values)\n[3 distinct values]"
        );
    }

    #[tokio::test]
    async fn test_value_counts_unknown_column() {
        let tool = ValueCountsTool::new(Arc::new(sample_frame()), 50);
        let result = tool.execute(json!({"column": "country"})).await.unwrap();
        assert!(!result.success);
    }
}
