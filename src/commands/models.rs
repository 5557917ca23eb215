//! Model inspection commands for askcsv
//!
//! Lists the models a provider offers and shows which model each tier is
//! configured to use.

use crate::config::Config;
use crate::error::{AskCsvError, Result};
use crate::model_tier::ModelTier;
use crate::providers::{self, ModelInfo};
use crate::usage::Pricing;
use prettytable::{row, Table};

/// List available models from the configured provider
///
/// The provider is created for the tier's model, which matters only for
/// credential checks.
///
/// # Examples
///
/// ```no_run
/// use askcsv::config::Config;
/// use askcsv::commands::models::list_models;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load("config/config.yaml", &Default::default())?;
/// list_models(&config, None, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_models(config: &Config, tier: Option<ModelTier>, json: bool) -> Result<()> {
    let tier = tier.unwrap_or(config.models.default_tier);
    let provider_type = &config.provider.provider_type;
    tracing::info!("Listing models from provider: {}", provider_type);

    let provider = providers::create_provider(&config.provider, tier.model_id(&config.models))?;
    let models = provider.list_models().await?;

    if json {
        let json = serde_json::to_string_pretty(&models).map_err(AskCsvError::Serialization)?;
        println!("{}", json);
        return Ok(());
    }

    if models.is_empty() {
        println!("No models available from provider: {}", provider_type);
        return Ok(());
    }

    println!("\nAvailable models from {}:\n", provider_type);
    models_table(&models, config).printstd();
    println!();
    Ok(())
}

/// Show the model configured for each tier (or just one)
pub fn show_current_model(config: &Config, tier: Option<ModelTier>) -> Result<()> {
    println!("\nProvider: {}\n", config.provider.provider_type);
    current_table(config, tier).printstd();
    println!();
    Ok(())
}

/// Table of provider models, marking the ones bound to a tier
fn models_table(models: &[ModelInfo], config: &Config) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Model Name", "Owner", "Size", "Tier"]);

    for model in models {
        let tiers: Vec<String> = ModelTier::ALL
            .iter()
            .filter(|t| t.model_id(&config.models) == model.name)
            .map(|t| t.to_string())
            .collect();
        table.add_row(row![
            model.name,
            model.owned_by.as_deref().unwrap_or("-"),
            model.size_bytes.map(format_size).unwrap_or_else(|| "-".to_string()),
            if tiers.is_empty() {
                "-".to_string()
            } else {
                tiers.join(", ")
            }
        ]);
    }
    table
}

/// Table of tier → model with description and price
fn current_table(config: &Config, tier: Option<ModelTier>) -> Table {
    let pricing = Pricing::new(config.usage.pricing.clone());
    let mut table = Table::new();
    table.add_row(row!["Tier", "Model", "Description", "Prompt $/1K", "Completion $/1K"]);

    let tiers: Vec<ModelTier> = match tier {
        Some(tier) => vec![tier],
        None => ModelTier::ALL.to_vec(),
    };
    for tier in tiers {
        let model = tier.model_id(&config.models);
        let (prompt, completion) = match pricing.lookup(model) {
            Some(price) => (
                format!("{}", price.prompt_per_1k),
                format!("{}", price.completion_per_1k),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        let label = if tier == config.models.default_tier {
            format!("{} (default)", tier.label())
        } else {
            tier.label().to_string()
        };
        table.add_row(row![label, model, tier.description(), prompt, completion]);
    }
    table
}

fn format_size(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.1} MB", bytes / MB)
    }
}
