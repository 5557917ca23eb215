//! Command-line interface definition for askcsv
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for terminal chat, the web UI, one-shot questions,
//! model inspection, and usage reports.

use crate::model_tier::ModelTier;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// askcsv - Ask questions about a CSV dataset
///
/// Answers natural-language questions about a dataset using an LLM agent
/// grounded in the data and its data dictionary.
#[derive(Parser, Debug, Clone)]
#[command(name = "askcsv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the dataset CSV path
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Override the data dictionary path
    #[arg(long, global = true)]
    pub dictionary: Option<PathBuf>,

    /// Override the provider from config (openai, ollama)
    #[arg(short, long, global = true)]
    pub provider: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for askcsv
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive terminal chat about the dataset
    Chat {
        /// Model tier to start with: fast or accurate
        #[arg(short, long, value_parser = ModelTier::parse_str)]
        tier: Option<ModelTier>,
    },

    /// Serve the chat web UI
    Serve {
        /// Bind host (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Model tier to start with: fast or accurate
        #[arg(short, long, value_parser = ModelTier::parse_str)]
        tier: Option<ModelTier>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Model tier: fast or accurate
        #[arg(short, long, value_parser = ModelTier::parse_str)]
        tier: Option<ModelTier>,

        /// Print the answer and usage as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configured and available models
    Models {
        /// Model subcommand
        #[command(subcommand)]
        command: ModelCommand,
    },

    /// Summarize logged usage and cost
    Usage {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Only consider the most recent N queries
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Model subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ModelCommand {
    /// List models available from the provider
    List {
        /// Tier whose model is used to connect
        #[arg(short, long, value_parser = ModelTier::parse_str)]
        tier: Option<ModelTier>,

        /// Print the model list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the model configured for each tier
    Current {
        /// Only show this tier
        #[arg(short, long, value_parser = ModelTier::parse_str)]
        tier: Option<ModelTier>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The joined question text for `ask`, if that is the command
    pub fn question(&self) -> Option<String> {
        match &self.command {
            Commands::Ask { question, .. } => Some(question.join(" ")),
            _ => None,
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            dataset: None,
            dictionary: None,
            provider: None,
            command: Commands::Chat { tier: None },
        }
    }
}
