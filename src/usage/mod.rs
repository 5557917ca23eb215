//! Per-query usage and cost logging
//!
//! Every answered question produces a [`UsageRecord`]: token counts summed
//! over the agent's provider requests, the number of requests, and the cost
//! computed from the configured price table. Records are logged, counted in
//! metrics, and appended to a JSON-lines ledger.

pub mod metrics;

use crate::config::{ModelPricing, UsageConfig};
use crate::error::Result;
use crate::model_tier::ModelTier;
use crate::providers::TokenUsage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Price table lookup
#[derive(Debug, Clone, Default)]
pub struct Pricing {
    entries: Vec<ModelPricing>,
}

impl Pricing {
    /// Create a price table
    pub fn new(entries: Vec<ModelPricing>) -> Self {
        Self { entries }
    }

    /// Find the price entry for a model
    ///
    /// An exact match wins; otherwise the longest `prefix*` entry that
    /// matches is used.
    pub fn lookup(&self, model: &str) -> Option<&ModelPricing> {
        if let Some(exact) = self.entries.iter().find(|p| p.model == model) {
            return Some(exact);
        }
        self.entries
            .iter()
            .filter_map(|p| {
                p.model
                    .strip_suffix('*')
                    .filter(|prefix| model.starts_with(prefix))
                    .map(|prefix| (prefix.len(), p))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, p)| p)
    }

    /// Cost in USD of `usage` on `model`
    ///
    /// Models missing from the table cost nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use askcsv::config::ModelPricing;
    /// use askcsv::providers::TokenUsage;
    /// use askcsv::usage::Pricing;
    ///
    /// let pricing = Pricing::new(vec![ModelPricing {
    ///     model: "gpt-4".to_string(),
    ///     prompt_per_1k: 0.03,
    ///     completion_per_1k: 0.06,
    /// }]);
    /// let cost = pricing.cost("gpt-4", &TokenUsage::new(1000, 500));
    /// assert!((cost - 0.06).abs() < 1e-9);
    /// ```
    pub fn cost(&self, model: &str, usage: &TokenUsage) -> f64 {
        match self.lookup(model) {
            Some(price) => {
                usage.prompt_tokens as f64 / 1000.0 * price.prompt_per_1k
                    + usage.completion_tokens as f64 / 1000.0 * price.completion_per_1k
            }
            None => {
                debug!("No pricing configured for model {}, cost recorded as 0", model);
                0.0
            }
        }
    }
}

/// Usage of one answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Unique record id
    pub id: uuid::Uuid,
    /// When the answer was produced
    pub timestamp: DateTime<Utc>,
    /// Model that produced the answer
    pub model: String,
    /// Tier selected when the question was asked
    pub tier: ModelTier,
    /// Prompt tokens over all requests
    pub prompt_tokens: usize,
    /// Completion tokens over all requests
    pub completion_tokens: usize,
    /// Prompt plus completion tokens
    pub total_tokens: usize,
    /// Provider requests that returned a response
    pub successful_requests: usize,
    /// Tool calls executed by the agent
    #[serde(default)]
    pub tool_calls: usize,
    /// Cost in USD
    pub total_cost_usd: f64,
    /// Wall time of the question in milliseconds
    pub duration_ms: u64,
}

impl UsageRecord {
    /// Build a record with a fresh id and the current time
    pub fn new(
        model: impl Into<String>,
        tier: ModelTier,
        usage: TokenUsage,
        successful_requests: usize,
        total_cost_usd: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            model: model.into(),
            tier,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            successful_requests,
            tool_calls: 0,
            total_cost_usd,
            duration_ms: 0,
        }
    }

    /// Set the tool call count
    pub fn with_tool_calls(mut self, tool_calls: usize) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Set the wall time
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// One-line summary shown under an answer
    pub fn summary_line(&self) -> String {
        format!(
            "{} | tokens: {} (prompt {}, completion {}) | requests: {} | cost: ${:.4}",
            self.model,
            self.total_tokens,
            self.prompt_tokens,
            self.completion_tokens,
            self.successful_requests,
            self.total_cost_usd
        )
    }
}

/// Aggregated usage for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Model identifier
    pub model: String,
    /// Number of answered questions
    pub queries: usize,
    /// Prompt tokens
    pub prompt_tokens: usize,
    /// Completion tokens
    pub completion_tokens: usize,
    /// Total tokens
    pub total_tokens: usize,
    /// Provider requests
    pub requests: usize,
    /// Cost in USD
    pub total_cost_usd: f64,
}

/// Sum records per model, ordered by model name
pub fn summarize(records: &[UsageRecord]) -> Vec<UsageSummary> {
    let mut by_model: BTreeMap<&str, UsageSummary> = BTreeMap::new();
    for record in records {
        let entry = by_model
            .entry(record.model.as_str())
            .or_insert_with(|| UsageSummary {
                model: record.model.clone(),
                queries: 0,
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens: 0,
                requests: 0,
                total_cost_usd: 0.0,
            });
        entry.queries += 1;
        entry.prompt_tokens += record.prompt_tokens;
        entry.completion_tokens += record.completion_tokens;
        entry.total_tokens += record.total_tokens;
        entry.requests += record.successful_requests;
        entry.total_cost_usd += record.total_cost_usd;
    }
    by_model.into_values().collect()
}

/// Usage ledger: logs each record and appends it to a JSON-lines file
#[derive(Debug, Clone)]
pub struct UsageLedger {
    path: Option<PathBuf>,
    pricing: Pricing,
}

impl UsageLedger {
    /// Create a ledger writing to `path` (or only logging when `None`)
    pub fn new(path: Option<PathBuf>, pricing: Pricing) -> Self {
        Self { path, pricing }
    }

    /// Create a ledger from the usage configuration
    pub fn from_config(config: &UsageConfig) -> Self {
        Self::new(config.log_path.clone(), Pricing::new(config.pricing.clone()))
    }

    /// Ledger file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The price table
    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    /// Log a record and append it to the ledger file
    ///
    /// # Errors
    ///
    /// Returns error if the ledger file cannot be written
    pub fn record(&self, record: &UsageRecord) -> Result<()> {
        info!(
            model = %record.model,
            tier = %record.tier,
            total_tokens = record.total_tokens,
            prompt_tokens = record.prompt_tokens,
            completion_tokens = record.completion_tokens,
            successful_requests = record.successful_requests,
            total_cost_usd = record.total_cost_usd,
            "Query usage"
        );

        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        debug!("Appended usage record {} to {}", record.id, path.display());
        Ok(())
    }

    /// Read every record from the ledger file
    ///
    /// A missing file yields no records. Lines that fail to parse are
    /// skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<UsageRecord>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<UsageRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping malformed usage record at {}:{}: {}",
                    path.display(),
                    index + 1,
                    e
                ),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_dir;

    fn pricing() -> Pricing {
        Pricing::new(UsageConfig::default().pricing)
    }

    fn record(model: &str, prompt: usize, completion: usize, cost: f64) -> UsageRecord {
        UsageRecord::new(
            model,
            ModelTier::Fast,
            TokenUsage::new(prompt, completion),
            1,
            cost,
        )
    }

    #[test]
    fn test_cost_for_exact_model() {
        let cost = pricing().cost("gpt-4", &TokenUsage::new(2000, 1000));
        assert!((cost - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_cost_uses_longest_prefix() {
        let pricing = pricing();
        assert_eq!(
            pricing.lookup("gpt-4o-mini-2024-07-18").unwrap().model,
            "gpt-4o-mini*"
        );
        assert_eq!(pricing.lookup("gpt-4o").unwrap().model, "gpt-4o*");
        let cost = pricing.cost("gpt-3.5-turbo-0125", &TokenUsage::new(1000, 1000));
        assert!((cost - 0.0035).abs() < 1e-9);
    }

    #[test]
    fn test_cost_unknown_model_is_zero() {
        assert_eq!(pricing().cost("llama3.2", &TokenUsage::new(5000, 5000)), 0.0);
        assert!(pricing().lookup("gpt-4-turbo").is_none());
    }

    #[test]
    fn test_record_and_read_all_round_trip() {
        let dir = temp_dir();
        let path = dir.path().join("nested").join("usage.jsonl");
        let ledger = UsageLedger::new(Some(path.clone()), pricing());

        let first = record("gpt-3.5-turbo", 100, 20, 0.0002).with_tool_calls(2);
        let second = record("gpt-4", 300, 40, 0.0114).with_duration_ms(850);
        ledger.record(&first).unwrap();
        ledger.record(&second).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let records = ledger.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[0].tool_calls, 2);
        assert_eq!(records[1].model, "gpt-4");
        assert_eq!(records[1].total_tokens, 340);
        assert_eq!(records[1].duration_ms, 850);
        assert_eq!(records[1].timestamp, second.timestamp);
        assert!((records[1].total_cost_usd - 0.0114).abs() < 1e-12);
    }

    #[test]
    fn test_read_all_skips_malformed_lines() {
        let dir = temp_dir();
        let path = dir.path().join("usage.jsonl");
        let ledger = UsageLedger::new(Some(path.clone()), pricing());
        ledger.record(&record("gpt-4", 1, 1, 0.0)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file).unwrap();

        assert_eq!(ledger.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_ledger_without_path() {
        let ledger = UsageLedger::new(None, pricing());
        ledger.record(&record("gpt-4", 1, 1, 0.0)).unwrap();
        assert!(ledger.read_all().unwrap().is_empty());
        assert!(ledger.path().is_none());
    }

    #[test]
    fn test_read_all_missing_file() {
        let dir = temp_dir();
        let ledger = UsageLedger::new(Some(dir.path().join("absent.jsonl")), pricing());
        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_summarize_per_model() {
        let records = vec![
            record("gpt-4", 100, 10, 0.0036),
            record("gpt-3.5-turbo", 50, 5, 0.0001),
            record("gpt-4", 200, 20, 0.0072),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].model, "gpt-3.5-turbo");
        assert_eq!(summary[1].queries, 2);
        assert_eq!(summary[1].prompt_tokens, 300);
        assert_eq!(summary[1].total_tokens, 330);
        assert!((summary[1].total_cost_usd - 0.0108).abs() < 1e-9);
    }

    #[test]
    fn test_summary_line() {
        let line = record("gpt-4", 100, 10, 0.0036).summary_line();
        assert_eq!(
            line,
            "gpt-4 | tokens: 110 (prompt 100, completion 10) | requests: 1 | cost: $0.0036"
        );
    }
}
