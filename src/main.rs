//! askcsv - Ask questions about a CSV dataset
//!
#![doc = "askcsv - Ask questions about a CSV dataset"]
#![doc = "Main entry point for the askcsv application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use askcsv::cli::{Cli, Commands, ModelCommand};
use askcsv::commands;
use askcsv::config::Config;
use askcsv::usage::metrics::init_metrics_exporter;

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials such as OPENAI_API_KEY may live in .env
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    init_metrics_exporter();

    // Execute command
    match cli.command {
        Commands::Chat { tier } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(t) = &tier {
                tracing::debug!("Using tier override: {}", t);
            }
            commands::chat::run_chat(config, tier).await?;
            Ok(())
        }
        Commands::Serve { host, port, tier } => {
            tracing::info!("Starting web UI");
            commands::serve::run_serve(config, host, port, tier).await?;
            Ok(())
        }
        Commands::Ask {
            question,
            tier,
            json,
        } => {
            let question = question.join(" ");
            tracing::debug!("Answering one question: {}", question);
            commands::ask::run_ask(config, question, tier, json).await?;
            Ok(())
        }
        Commands::Models { command } => {
            tracing::info!("Starting model command");
            match command {
                ModelCommand::List { tier, json } => {
                    commands::models::list_models(&config, tier, json).await?;
                    Ok(())
                }
                ModelCommand::Current { tier } => {
                    commands::models::show_current_model(&config, tier)?;
                    Ok(())
                }
            }
        }
        Commands::Usage { json, limit } => {
            commands::usage::show_usage(&config, json, limit)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so `ask --json`
/// output stays parseable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "askcsv=debug" } else { "askcsv=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
