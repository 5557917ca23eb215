//! Query metrics
//!
//! Counters and histograms for answered questions, recorded through the
//! `metrics` facade. Without an installed recorder these calls are no-ops.
//!
//! # Metrics
//!
//! - `askcsv_queries_total{tier, status}`
//! - `askcsv_query_duration_seconds{tier}`
//! - `askcsv_tokens_total{model, kind}`
//! - `askcsv_cost_micro_usd_total{model}`

use metrics::{counter, histogram, increment_counter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::UsageRecord;
use crate::model_tier::ModelTier;

/// Tracks one question from submission to answer or failure
///
/// Recording is idempotent; only the first `record_*` call counts. A tracker
/// dropped before either call records the question as `cancelled`.
///
/// # Examples
///
/// ```
/// use askcsv::model_tier::ModelTier;
/// use askcsv::usage::metrics::QueryMetrics;
///
/// let metrics = QueryMetrics::new(ModelTier::Fast);
/// metrics.record_error("provider");
/// ```
pub struct QueryMetrics {
    tier: ModelTier,
    start: Instant,
    recorded: AtomicBool,
}

impl QueryMetrics {
    /// Start tracking a question for a tier
    pub fn new(tier: ModelTier) -> Self {
        Self {
            tier,
            start: Instant::now(),
            recorded: AtomicBool::new(false),
        }
    }

    /// Time since tracking started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record a successful answer
    pub fn record_completion(&self, record: &UsageRecord) {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return;
        }

        histogram!(
            "askcsv_query_duration_seconds",
            self.elapsed().as_secs_f64(),
            "tier" => self.tier.to_string()
        );
        increment_counter!(
            "askcsv_queries_total",
            "tier" => self.tier.to_string(),
            "status" => "success"
        );
        counter!(
            "askcsv_tokens_total",
            record.prompt_tokens as u64,
            "model" => record.model.clone(),
            "kind" => "prompt"
        );
        counter!(
            "askcsv_tokens_total",
            record.completion_tokens as u64,
            "model" => record.model.clone(),
            "kind" => "completion"
        );
        counter!(
            "askcsv_cost_micro_usd_total",
            (record.total_cost_usd * 1_000_000.0).round() as u64,
            "model" => record.model.clone()
        );
    }

    /// Record a failed question
    pub fn record_error(&self, kind: &str) {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return;
        }

        histogram!(
            "askcsv_query_duration_seconds",
            self.elapsed().as_secs_f64(),
            "tier" => self.tier.to_string()
        );
        increment_counter!(
            "askcsv_queries_total",
            "tier" => self.tier.to_string(),
            "status" => kind.to_string()
        );
    }

    fn is_recorded(&self) -> bool {
        self.recorded.load(Ordering::SeqCst)
    }
}

impl Drop for QueryMetrics {
    fn drop(&mut self) {
        if !self.is_recorded() {
            self.record_error("cancelled");
        }
    }
}

/// Installs the Prometheus exporter when built with the `prometheus` feature
///
/// A no-op otherwise.
pub fn init_metrics_exporter() {
    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let _ = builder.install().map_err(|e| {
            tracing::warn!("Failed to install Prometheus exporter: {}", e);
        });
    }
}
