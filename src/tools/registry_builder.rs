//! Tool registry builder for the table tools
//!
//! All tools share one read-only view of the loaded dataset.

use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::dataset::DataFrame;
use crate::tools::{
    AggregateColumnTool, DescribeTableTool, FilterRowsTool, GroupByTool, PreviewRowsTool,
    SortRowsTool, ToolExecutor, ToolRegistry, ValueCountsTool,
};

/// Builder for the dataframe tool registry
///
/// # Examples
///
/// ```
/// use askcsv::dataset::DataFrame;
/// use askcsv::tools::ToolRegistryBuilder;
/// use std::sync::Arc;
///
/// let frame = DataFrame::from_reader("a,b\n1,2\n".as_bytes()).unwrap();
/// let registry = ToolRegistryBuilder::new(Arc::new(frame)).build();
/// assert_eq!(registry.len(), 7);
/// ```
pub struct ToolRegistryBuilder {
    /// The dataset every tool operates on
    frame: Arc<DataFrame>,
    /// Tools configuration
    tools_config: ToolsConfig,
}

impl ToolRegistryBuilder {
    /// Create a new tool registry builder over a dataset
    pub fn new(frame: Arc<DataFrame>) -> Self {
        Self {
            frame,
            tools_config: ToolsConfig::default(),
        }
    }

    /// Set the tools configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The tools configuration
    ///
    /// # Returns
    ///
    /// Returns self for method chaining
    pub fn with_tools_config(mut self, config: ToolsConfig) -> Self {
        self.tools_config = config;
        self
    }

    /// Build a registry containing every table tool
    pub fn build(&self) -> ToolRegistry {
        let frame = &self.frame;
        let max_rows = self.tools_config.max_rows;

        let tools: Vec<(&str, Arc<dyn ToolExecutor>)> = vec![
            ("describe_table", Arc::new(DescribeTableTool::new(frame.clone()))),
            (
                "preview_rows",
                Arc::new(PreviewRowsTool::new(frame.clone(), max_rows)),
            ),
            (
                "filter_rows",
                Arc::new(FilterRowsTool::new(frame.clone(), max_rows)),
            ),
            ("sort_rows", Arc::new(SortRowsTool::new(frame.clone(), max_rows))),
            (
                "aggregate_column",
                Arc::new(AggregateColumnTool::new(frame.clone())),
            ),
            ("group_by", Arc::new(GroupByTool::new(frame.clone(), max_rows))),
            (
                "value_counts",
                Arc::new(ValueCountsTool::new(frame.clone(), max_rows)),
            ),
        ];

        let mut registry = ToolRegistry::new();
        for (name, executor) in tools {
            registry.register(name, executor);
        }
        tracing::debug!("Registered {} table tools", registry.len());
        registry
    }

    /// Get the tools configuration
    pub fn tools_config(&self) -> &ToolsConfig {
        &self.tools_config
    }
}
