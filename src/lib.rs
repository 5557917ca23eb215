//! askcsv - Ask questions about a CSV dataset
//!
//! This library loads a CSV dataset and its data dictionary, builds an
//! instruction prefix from them, and answers natural-language questions with
//! a tool-calling LLM agent. Every answer is priced and logged.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `dataset`: CSV loading, typed column operations, and the data dictionary
//! - `prompts`: Instruction prefix built from the dataset and dictionary
//! - `tools`: Dataframe tools the agent can call, and their registry
//! - `agent`: Conversation management and the tool-calling loop
//! - `providers`: Chat provider abstraction and implementations (OpenAI, Ollama)
//! - `model_tier`: Fast/accurate model selection
//! - `usage`: Token usage, cost, and the usage ledger
//! - `session`: A chat session: transcript, tier switching, and usage logging
//! - `web`: Chat web UI served with axum
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use askcsv::providers::ConfigProviderFactory;
//! use askcsv::{ChatSession, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let factory = Arc::new(ConfigProviderFactory::new(config.provider.clone()));
//!     let mut session = ChatSession::from_config(config, factory, None)?;
//!     let answer = session.ask("How many rows are there?").await?;
//!     println!("{}", answer.content);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model_tier;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod tools;
pub mod usage;
pub mod web;

// Re-export commonly used types
pub use agent::Agent;
pub use config::Config;
pub use dataset::{DataDictionary, DataFrame};
pub use error::{AskCsvError, Result};
pub use model_tier::ModelTier;
pub use session::ChatSession;

#[cfg(test)]
pub mod test_utils;
