//! Chat session shared by the terminal and web front ends
//!
//! A session owns the transcript shown to the user, the selected model tier
//! and the agent built for it. The agent is rebuilt only when the tier
//! changes.

use crate::agent::Agent;
use crate::config::Config;
use crate::dataset::{DataDictionary, DataFrame};
use crate::error::{AskCsvError, Result};
use crate::model_tier::ModelTier;
use crate::prompts::{build_instruction_prefix, resolve_as_of_date};
use crate::providers::ProviderFactory;
use crate::tools::ToolRegistryBuilder;
use crate::usage::metrics::QueryMetrics;
use crate::usage::{UsageLedger, UsageRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions
    User,
    /// The agent's answer
    Assistant,
}

/// One message of the visible transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl TranscriptEntry {
    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text, also appended to the transcript
    pub content: String,
    /// Usage and cost of producing it
    pub usage: UsageRecord,
}

/// Question-answering session over one dataset
pub struct ChatSession {
    transcript: Vec<TranscriptEntry>,
    tier: ModelTier,
    agent: Agent,
    factory: Arc<dyn ProviderFactory>,
    frame: Arc<DataFrame>,
    prefix: String,
    config: Config,
    ledger: UsageLedger,
    records: Vec<UsageRecord>,
    agent_builds: usize,
}

impl ChatSession {
    /// Create a session over an already loaded dataset
    ///
    /// # Errors
    ///
    /// Returns error if `data.as_of_date` is invalid or the provider for
    /// the initial tier cannot be created
    pub fn new(
        config: Config,
        frame: DataFrame,
        dictionary: &DataDictionary,
        factory: Arc<dyn ProviderFactory>,
        tier: ModelTier,
    ) -> Result<Self> {
        let as_of_date = resolve_as_of_date(config.data.as_of_date.as_deref())?;
        let frame = Arc::new(frame);
        let prefix = build_instruction_prefix(&frame, dictionary, as_of_date);
        debug!("Instruction prefix is {} bytes", prefix.len());

        let agent = build_agent(&config, &frame, &prefix, factory.as_ref(), tier)?;
        let ledger = UsageLedger::from_config(&config.usage);

        Ok(Self {
            transcript: Vec::new(),
            tier,
            agent,
            factory,
            frame,
            prefix,
            config,
            ledger,
            records: Vec::new(),
            agent_builds: 1,
        })
    }

    /// Create a session, loading the dataset and dictionary named in config
    ///
    /// Uses `models.default_tier` when `tier` is `None`.
    pub fn from_config(
        config: Config,
        factory: Arc<dyn ProviderFactory>,
        tier: Option<ModelTier>,
    ) -> Result<Self> {
        let frame = DataFrame::from_path(&config.data.dataset_path)?;
        let dictionary = DataDictionary::load(&config.data.dictionary_path)?;
        match dictionary.source() {
            Some(path) => info!("Data dictionary loaded from {}", path.display()),
            None => info!("No data dictionary; the prompt lists column names only"),
        }
        let tier = tier.unwrap_or(config.models.default_tier);
        Self::new(config, frame, &dictionary, factory, tier)
    }

    /// Switch the model tier
    ///
    /// Returns `true` when the agent was rebuilt, `false` when `tier` was
    /// already active. On failure the previous tier and agent stay active.
    pub fn select_tier(&mut self, tier: ModelTier) -> Result<bool> {
        if tier == self.tier {
            debug!("Tier {} already active", tier);
            return Ok(false);
        }

        let agent = build_agent(
            &self.config,
            &self.frame,
            &self.prefix,
            self.factory.as_ref(),
            tier,
        )?;
        info!(
            "Switched model tier {} -> {} ({})",
            self.tier,
            tier,
            agent.model()
        );
        self.agent = agent;
        self.tier = tier;
        self.agent_builds += 1;
        Ok(true)
    }

    /// Ask a question
    ///
    /// The question is appended to the transcript before the agent runs.
    /// If the agent fails, the question stays in the transcript and no
    /// answer is appended.
    ///
    /// # Errors
    ///
    /// - `AskCsvError::EmptyQuestion` for blank input (transcript untouched)
    /// - any agent or provider error
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(AskCsvError::EmptyQuestion.into());
        }

        self.transcript.push(TranscriptEntry::user(question));
        let metrics = QueryMetrics::new(self.tier);

        let outcome = match self.agent.run(question).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Question failed on {}: {}", self.agent.model(), e);
                metrics.record_error(error_kind(&e));
                return Err(e);
            }
        };

        let cost = self.ledger.pricing().cost(&outcome.model, &outcome.usage);
        let record = UsageRecord::new(
            outcome.model.clone(),
            self.tier,
            outcome.usage,
            outcome.requests,
            cost,
        )
        .with_tool_calls(outcome.tool_calls)
        .with_duration_ms(metrics.elapsed().as_millis() as u64);
        metrics.record_completion(&record);
        if let Err(e) = self.ledger.record(&record) {
            warn!("Failed to write usage ledger: {}", e);
        }

        self.transcript
            .push(TranscriptEntry::assistant(outcome.answer.clone()));
        self.records.push(record.clone());

        Ok(Answer {
            content: outcome.answer,
            usage: record,
        })
    }

    /// Transcript in arrival order
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Clear the transcript
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Active tier
    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    /// Model behind the active tier
    pub fn model(&self) -> &str {
        self.agent.model()
    }

    /// The loaded dataset
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Instruction prefix shared by every agent of this session
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Configuration the session was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Usage of the questions answered in this session
    pub fn usage_records(&self) -> &[UsageRecord] {
        &self.records
    }

    /// The usage ledger
    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// How many agents have been built, including the initial one
    pub fn agent_builds(&self) -> usize {
        self.agent_builds
    }
}

fn build_agent(
    config: &Config,
    frame: &Arc<DataFrame>,
    prefix: &str,
    factory: &dyn ProviderFactory,
    tier: ModelTier,
) -> Result<Agent> {
    let model = tier.model_id(&config.models);
    let provider = factory.create(model)?;
    let tools = ToolRegistryBuilder::new(frame.clone())
        .with_tools_config(config.agent.tools.clone())
        .build();
    Agent::new(provider, tools, config.agent.clone(), prefix)
}

fn error_kind(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<AskCsvError>() {
        Some(AskCsvError::Timeout(_)) => "timeout",
        Some(AskCsvError::MaxIterationsExceeded { .. }) => "max_iterations",
        Some(AskCsvError::Authentication(_)) => "authentication",
        Some(AskCsvError::Http(_)) => "http",
        _ => "error",
    }
}
