//! Model tier selection
//!
//! The UI offers two backends: a cheap, fast model and a slower, more
//! accurate one. This module maps the user's choice to the configured
//! model identifier.

use crate::config::ModelsConfig;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model tier chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheaper, faster model
    #[default]
    Fast,

    /// More accurate, slower model
    Accurate,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Accurate => write!(f, "accurate"),
        }
    }
}

impl ModelTier {
    /// All tiers in display order
    pub const ALL: [ModelTier; 2] = [ModelTier::Fast, ModelTier::Accurate];

    /// Parse a tier from user input
    ///
    /// Accepts the tier names plus the aliases people tend to type
    /// ("cheap", "slow", "3.5", "4").
    ///
    /// # Examples
    ///
    /// ```
    /// use askcsv::model_tier::ModelTier;
    ///
    /// assert_eq!(ModelTier::parse_str("fast").unwrap(), ModelTier::Fast);
    /// assert_eq!(ModelTier::parse_str("Accurate").unwrap(), ModelTier::Accurate);
    /// assert!(ModelTier::parse_str("medium").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "fast" | "cheap" | "3.5" => Ok(Self::Fast),
            "accurate" | "slow" | "4" => Ok(Self::Accurate),
            other => Err(format!(
                "Unknown model tier: {} (expected 'fast' or 'accurate')",
                other
            )),
        }
    }

    /// Resolve the configured model identifier for this tier
    ///
    /// # Examples
    ///
    /// ```
    /// use askcsv::config::ModelsConfig;
    /// use askcsv::model_tier::ModelTier;
    ///
    /// let models = ModelsConfig::default();
    /// assert_eq!(ModelTier::Fast.model_id(&models), models.fast);
    /// assert_eq!(ModelTier::Accurate.model_id(&models), models.accurate);
    /// ```
    pub fn model_id<'a>(&self, models: &'a ModelsConfig) -> &'a str {
        match self {
            Self::Fast => &models.fast,
            Self::Accurate => &models.accurate,
        }
    }

    /// Label shown next to the selector
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fast => "Fast (cheaper)",
            Self::Accurate => "Accurate (slower)",
        }
    }

    /// One-line description of the trade-off
    pub fn description(&self) -> &'static str {
        match self {
            Self::Fast => "Lower cost and latency, may miss harder questions",
            Self::Accurate => "Better reasoning over the data, higher cost",
        }
    }

    /// Colored tag for terminal prompts
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Fast => format!("[{}]", "FAST".cyan()),
            Self::Accurate => format!("[{}]", "ACCURATE".purple()),
        }
    }
}
