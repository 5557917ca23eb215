//! Configuration management for askcsv
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{AskCsvError, Result};
use crate::model_tier::ModelTier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for askcsv
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration (OpenAI-compatible, Ollama)
    pub provider: ProviderConfig,
    /// Model identifiers for the two tiers
    #[serde(default)]
    pub models: ModelsConfig,
    /// Dataset and data dictionary locations
    #[serde(default)]
    pub data: DataConfig,
    /// Agent behavior configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Web UI settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Usage and cost logging
    #[serde(default)]
    pub usage: UsageConfig,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use ("openai" or "ollama")
    #[serde(rename = "type")]
    pub provider_type: String,

    /// OpenAI-compatible provider configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL (without trailing `/chat/completions`)
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature; answers about data should be deterministic
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout for a single completion call (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_api_base(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
        }
    }
}

/// Model identifiers for the fast and accurate tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Cheaper, faster model
    #[serde(default = "default_fast_model")]
    pub fast: String,

    /// More accurate, slower model
    #[serde(default = "default_accurate_model")]
    pub accurate: String,

    /// Tier selected when a session starts
    #[serde(default)]
    pub default_tier: ModelTier,
}

fn default_fast_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_accurate_model() -> String {
    "gpt-4".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            accurate: default_accurate_model(),
            default_tier: ModelTier::Fast,
        }
    }
}

/// Dataset and dictionary locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV dataset path
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Data dictionary path (plain text or CSV)
    #[serde(default = "default_dictionary_path")]
    pub dictionary_path: PathBuf,

    /// Date injected into the instructions (YYYY-MM-DD); today when unset
    #[serde(default)]
    pub as_of_date: Option<String>,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("./data/data_csv.csv")
}

fn default_dictionary_path() -> PathBuf {
    PathBuf::from("./data/dictionary.txt")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            dictionary_path: default_dictionary_path(),
            as_of_date: None,
        }
    }
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of provider round trips per question
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Timeout for answering a single question (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Tool execution settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_max_turns() -> usize {
    15
}

fn default_timeout() -> u64 {
    300
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            timeout_seconds: default_timeout(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Tool execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Maximum tool output size in bytes before truncation
    #[serde(default = "default_max_output")]
    pub max_output_size: usize,

    /// Maximum number of rows a tool may print
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_max_output() -> usize {
    16_384
}

fn default_max_rows() -> usize {
    50
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_output_size: default_max_output(),
            max_rows: default_max_rows(),
        }
    }
}

/// Web UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Page title and header
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_title() -> String {
    "Ask me a question about the data CSV".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            title: default_title(),
        }
    }
}

/// Per-model token prices in USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model identifier (exact match, or prefix ending in `*`)
    pub model: String,
    /// USD per 1000 prompt tokens
    pub prompt_per_1k: f64,
    /// USD per 1000 completion tokens
    pub completion_per_1k: f64,
}

/// Usage and cost logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// JSON-lines ledger file; usage is not written to disk when unset
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Price table used to compute per-query cost
    #[serde(default = "default_pricing")]
    pub pricing: Vec<ModelPricing>,
}

/// Ledger location used when no config file exists
fn default_usage_log() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "askcsv")
        .map(|dirs| dirs.data_dir().join("usage.jsonl"))
}

fn default_pricing() -> Vec<ModelPricing> {
    vec![
        ModelPricing {
            model: "gpt-3.5-turbo*".to_string(),
            prompt_per_1k: 0.0015,
            completion_per_1k: 0.002,
        },
        ModelPricing {
            model: "gpt-4o-mini*".to_string(),
            prompt_per_1k: 0.00015,
            completion_per_1k: 0.0006,
        },
        ModelPricing {
            model: "gpt-4o*".to_string(),
            prompt_per_1k: 0.0025,
            completion_per_1k: 0.01,
        },
        ModelPricing {
            model: "gpt-4".to_string(),
            prompt_per_1k: 0.03,
            completion_per_1k: 0.06,
        },
    ]
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            pricing: default_pricing(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig {
                provider_type: "openai".to_string(),
                openai: OpenAiConfig::default(),
                ollama: OllamaConfig::default(),
            },
            models: ModelsConfig::default(),
            data: DataConfig::default(),
            agent: AgentConfig::default(),
            server: ServerConfig::default(),
            usage: UsageConfig {
                log_path: default_usage_log(),
                ..UsageConfig::default()
            },
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AskCsvError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AskCsvError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("ASKCSV_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(api_base) = std::env::var("ASKCSV_OPENAI_API_BASE") {
            self.provider.openai.api_base = api_base;
        }

        if let Ok(host) = std::env::var("ASKCSV_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("ASKCSV_FAST_MODEL") {
            self.models.fast = model;
        }

        if let Ok(model) = std::env::var("ASKCSV_ACCURATE_MODEL") {
            self.models.accurate = model;
        }

        if let Ok(path) = std::env::var("ASKCSV_DATASET") {
            self.data.dataset_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("ASKCSV_DICTIONARY") {
            self.data.dictionary_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("ASKCSV_USAGE_LOG") {
            self.usage.log_path = Some(PathBuf::from(path));
        }

        if let Ok(max_turns) = std::env::var("ASKCSV_MAX_TURNS") {
            if let Ok(value) = max_turns.parse() {
                self.agent.max_turns = value;
            } else {
                tracing::warn!("Invalid ASKCSV_MAX_TURNS: {}", max_turns);
            }
        }

        if let Ok(timeout) = std::env::var("ASKCSV_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.agent.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid ASKCSV_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(dataset) = &cli.dataset {
            tracing::debug!("Dataset override from CLI: {}", dataset.display());
            self.data.dataset_path = dataset.clone();
        }
        if let Some(dictionary) = &cli.dictionary {
            tracing::debug!("Dictionary override from CLI: {}", dictionary.display());
            self.data.dictionary_path = dictionary.clone();
        }
        if let Some(provider) = &cli.provider {
            self.provider.provider_type = provider.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `AskCsvError::Config` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ["openai", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(AskCsvError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.models.fast.trim().is_empty() || self.models.accurate.trim().is_empty() {
            return Err(AskCsvError::Config(
                "models.fast and models.accurate must both be set".to_string(),
            )
            .into());
        }

        if self.data.dataset_path.as_os_str().is_empty() {
            return Err(AskCsvError::Config("data.dataset_path cannot be empty".to_string()).into());
        }

        if let Some(date) = &self.data.as_of_date {
            if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(AskCsvError::Config(format!(
                    "data.as_of_date must be YYYY-MM-DD, got: {}",
                    date
                ))
                .into());
            }
        }

        if self.agent.max_turns == 0 || self.agent.max_turns > 100 {
            return Err(AskCsvError::Config(
                "agent.max_turns must be between 1 and 100".to_string(),
            )
            .into());
        }

        if self.agent.timeout_seconds == 0 {
            return Err(
                AskCsvError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.agent.tools.max_output_size == 0 || self.agent.tools.max_rows == 0 {
            return Err(AskCsvError::Config(
                "tools.max_output_size and tools.max_rows must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.port == 0 {
            return Err(AskCsvError::Config("server.port must be greater than 0".to_string()).into());
        }

        if let Some(bad) = self
            .usage
            .pricing
            .iter()
            .find(|p| p.prompt_per_1k < 0.0 || p.completion_per_1k < 0.0)
        {
            return Err(AskCsvError::Config(format!(
                "usage.pricing rates for {} must not be negative",
                bad.model
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "openai");
        assert_eq!(config.models.fast, "gpt-3.5-turbo");
        assert_eq!(config.models.accurate, "gpt-4");
        assert_eq!(config.agent.max_turns, 15);
        assert_eq!(
            config.data.dataset_path,
            PathBuf::from("./data/data_csv.csv")
        );
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = Config::default();
        config.provider.provider_type = "copilot".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.models.accurate = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_turns_bounds() {
        let mut config = Config::default();
        config.agent.max_turns = 0;
        assert!(config.validate().is_err());
        config.agent.max_turns = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_date() {
        let mut config = Config::default();
        config.data.as_of_date = Some("06/01/2023".to_string());
        assert!(config.validate().is_err());
        config.data.as_of_date = Some("2023-06-01".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_negative_price() {
        let mut config = Config::default();
        config.usage.pricing.push(ModelPricing {
            model: "free".to_string(),
            prompt_per_1k: -1.0,
            completion_per_1k: 0.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  type: ollama
  ollama:
    host: http://gpu-box:11434

models:
  fast: llama3.2:latest
  accurate: llama3.3:70b
  default_tier: accurate

data:
  dataset_path: ./sales.csv
  dictionary_path: ./sales_dictionary.csv
  as_of_date: "2023-06-01"

agent:
  max_turns: 8
  timeout_seconds: 60

usage:
  log_path: /tmp/askcsv-usage.jsonl
  pricing: []
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.provider_type, "ollama");
        assert_eq!(config.provider.ollama.host, "http://gpu-box:11434");
        assert_eq!(config.models.default_tier, ModelTier::Accurate);
        assert_eq!(config.data.as_of_date.as_deref(), Some("2023-06-01"));
        assert_eq!(config.agent.max_turns, 8);
        assert_eq!(config.agent.tools.max_rows, 50);
        assert!(config.usage.pricing.is_empty());
        assert_eq!(config.server.port, 8501);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.models.fast, "gpt-3.5-turbo");
        assert_eq!(config.usage.log_path, default_usage_log());
    }

    #[test]
    fn test_config_file_without_log_path_disables_ledger() {
        let yaml = "provider:\n  type: openai\nusage:\n  pricing: []\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.usage.log_path.is_none());

        let config: Config = serde_yaml::from_str("provider:\n  type: openai\n").unwrap();
        assert!(config.usage.log_path.is_none());
        assert!(!config.usage.pricing.is_empty());
    }

    #[test]
    fn test_cli_overrides_paths() {
        let cli = crate::cli::Cli {
            dataset: Some(PathBuf::from("other.csv")),
            dictionary: Some(PathBuf::from("other.txt")),
            provider: Some("ollama".to_string()),
            ..Default::default()
        };
        let mut config = Config::default();
        config.apply_cli_overrides(&cli);
        assert_eq!(config.data.dataset_path, PathBuf::from("other.csv"));
        assert_eq!(config.data.dictionary_path, PathBuf::from("other.txt"));
        assert_eq!(config.provider.provider_type, "ollama");
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_models_and_paths() {
        std::env::set_var("ASKCSV_FAST_MODEL", "gpt-4o-mini");
        std::env::set_var("ASKCSV_DATASET", "/data/listings.csv");
        std::env::set_var("ASKCSV_MAX_TURNS", "not-a-number");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("ASKCSV_FAST_MODEL");
        std::env::remove_var("ASKCSV_DATASET");
        std::env::remove_var("ASKCSV_MAX_TURNS");

        assert_eq!(config.models.fast, "gpt-4o-mini");
        assert_eq!(
            config.data.dataset_path,
            PathBuf::from("/data/listings.csv")
        );
        assert_eq!(config.agent.max_turns, 15);
    }
}
