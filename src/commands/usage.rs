//! Usage report command
//!
//! Reads the usage ledger and prints per-model totals.

use crate::config::Config;
use crate::error::{AskCsvError, Result};
use crate::usage::{summarize, UsageLedger, UsageRecord, UsageSummary};
use prettytable::{row, Table};
use serde::Serialize;

/// JSON shape of the report
#[derive(Debug, Serialize)]
struct UsageReport<'a> {
    queries: usize,
    total_tokens: usize,
    total_cost_usd: f64,
    by_model: &'a [UsageSummary],
}

/// Print usage totals from the ledger
///
/// # Arguments
///
/// * `config` - Configuration naming the ledger file
/// * `json` - Print JSON instead of a table
/// * `limit` - Only consider the most recent N records
///
/// # Errors
///
/// Returns error if the ledger exists but cannot be read
pub fn show_usage(config: &Config, json: bool, limit: Option<usize>) -> Result<()> {
    let ledger = UsageLedger::from_config(&config.usage);
    let Some(path) = ledger.path() else {
        println!("Usage logging is disabled (usage.log_path is not set)");
        return Ok(());
    };
    tracing::debug!("Reading usage ledger at {}", path.display());

    let records = recent(ledger.read_all()?, limit);
    let summaries = summarize(&records);

    if json {
        let report = UsageReport {
            queries: records.len(),
            total_tokens: summaries.iter().map(|s| s.total_tokens).sum(),
            total_cost_usd: summaries.iter().map(|s| s.total_cost_usd).sum(),
            by_model: &summaries,
        };
        let json = serde_json::to_string_pretty(&report).map_err(AskCsvError::Serialization)?;
        println!("{}", json);
        return Ok(());
    }

    if records.is_empty() {
        println!("No usage recorded yet");
        return Ok(());
    }

    println!("\nUsage from {}:\n", path.display());
    summary_table(&summaries).printstd();
    println!();
    Ok(())
}

fn recent(mut records: Vec<UsageRecord>, limit: Option<usize>) -> Vec<UsageRecord> {
    if let Some(limit) = limit {
        if records.len() > limit {
            records.drain(..records.len() - limit);
        }
    }
    records
}

/// Per-model table with a total row
pub(crate) fn summary_table(summaries: &[UsageSummary]) -> Table {
    let mut table = Table::new();
    table.add_row(row![
        "Model",
        "Queries",
        "Prompt",
        "Completion",
        "Total Tokens",
        "Requests",
        "Cost (USD)"
    ]);

    for s in summaries {
        table.add_row(row![
            s.model,
            r->s.queries,
            r->s.prompt_tokens,
            r->s.completion_tokens,
            r->s.total_tokens,
            r->s.requests,
            r->format!("${:.4}", s.total_cost_usd)
        ]);
    }

    if summaries.len() > 1 {
        table.add_row(row![
            b->"TOTAL",
            r->summaries.iter().map(|s| s.queries).sum::<usize>(),
            r->summaries.iter().map(|s| s.prompt_tokens).sum::<usize>(),
            r->summaries.iter().map(|s| s.completion_tokens).sum::<usize>(),
            r->summaries.iter().map(|s| s.total_tokens).sum::<usize>(),
            r->summaries.iter().map(|s| s.requests).sum::<usize>(),
            r->format!("${:.4}", summaries.iter().map(|s| s.total_cost_usd).sum::<f64>())
        ]);
    }
    table
}
