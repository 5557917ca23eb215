//! Error types for askcsv
//!
//! This module defines the error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for askcsv operations
///
/// Covers configuration loading, dataset and dictionary parsing, provider
/// interactions, tool execution against the dataframe, and the web surface.
#[derive(Error, Debug)]
pub enum AskCsvError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Dataset loading or query errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Data dictionary loading errors
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Agent exceeded maximum iteration limit
    #[error("Agent exceeded maximum iterations: limit={limit}, {message}")]
    MaxIterationsExceeded {
        /// The configured iteration limit
        limit: usize,
        /// Additional context about the failure
        message: String,
    },

    /// Agent ran longer than the configured timeout
    #[error("Agent execution timeout after {0} seconds")]
    Timeout(u64),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Authentication errors (e.g., 401 Unauthorized)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The user submitted an empty question
    #[error("Question cannot be empty")]
    EmptyQuestion,

    /// Web server errors (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for askcsv operations
///
/// Uses `anyhow::Error` as the error type so call sites can attach context
/// and propagate with `?`.
pub type Result<T> = anyhow::Result<T>;
