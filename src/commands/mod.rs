/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`: Interactive terminal chat about the dataset
- `ask`: Answer a single question
- `serve`: Serve the web chat UI

plus `models` and `usage` for inspecting configuration and spend.
*/

use crate::config::Config;
use crate::error::Result;
use crate::model_tier::ModelTier;
use crate::providers::{ConfigProviderFactory, ProviderFactory};
use crate::session::{ChatSession, Role, TranscriptEntry};
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

// Model inspection commands
pub mod models;

// Usage report command
pub mod usage;

fn config_factory(config: &Config) -> Arc<dyn ProviderFactory> {
    Arc::new(ConfigProviderFactory::new(config.provider.clone()))
}

/// Render the transcript for the terminal, one block per message
pub fn format_transcript(entries: &[TranscriptEntry]) -> String {
    use colored::Colorize;

    let mut out = String::new();
    for entry in entries {
        let label = match entry.role {
            Role::User => "You".bold().cyan(),
            Role::Assistant => "Assistant".bold().green(),
        };
        out.push_str(&format!("{}: {}\n\n", label, entry.content));
    }
    out
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Loads the dataset and dictionary, creates a `ChatSession`, and runs a
    //! readline loop that sends each line to the agent unless it is a
    //! special command.

    use super::*;
    use crate::commands::special_commands::{
        parse_special_command, print_help, SpecialCommand,
    };
    use crate::usage::summarize;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    const QUESTION_PROMPT: &str = "Ask a question about your CSV: ";

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `tier` - Optional starting tier; defaults to `models.default_tier`
    ///
    /// # Examples
    ///
    /// ```
    /// use askcsv::commands::chat;
    /// use askcsv::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), None).await?;
    /// ```
    pub async fn run_chat(config: Config, tier: Option<ModelTier>) -> Result<()> {
        let factory = config_factory(&config);
        let mut session = ChatSession::from_config(config, factory, tier)?;

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&session);

        loop {
            let prompt = format!("{} {}", session.tier().colored_tag(), QUESTION_PROMPT);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::SwitchTier(tier) => {
                            handle_tier_switch(&mut session, tier);
                            continue;
                        }
                        SpecialCommand::ShowHistory => {
                            if session.transcript().is_empty() {
                                println!("No messages yet\n");
                            } else {
                                println!();
                                print!("{}", format_transcript(session.transcript()));
                            }
                            continue;
                        }
                        SpecialCommand::ShowUsage => {
                            print_session_usage(&session);
                            continue;
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(&session);
                            continue;
                        }
                        SpecialCommand::Clear => {
                            session.clear();
                            println!("Conversation cleared\n");
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            // Regular question
                        }
                    }

                    rl.add_history_entry(trimmed)?;
                    println!("{}", "Thinking...".dimmed());

                    match session.ask(trimmed).await {
                        Ok(answer) => {
                            println!("\n{}\n", answer.content);
                            println!("{}\n", answer.usage.summary_line().dimmed());
                        }
                        Err(e) => {
                            eprintln!("{}\n", format!("Error: {}", e).red());
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Switch tier and report the outcome; failures keep the old tier
    fn handle_tier_switch(session: &mut ChatSession, tier: ModelTier) {
        match session.select_tier(tier) {
            Ok(true) => println!(
                "Switched to {} ({})\n",
                tier.colored_tag(),
                session.model()
            ),
            Ok(false) => println!(
                "Already using {} ({})\n",
                tier.colored_tag(),
                session.model()
            ),
            Err(e) => eprintln!(
                "{}\n",
                format!("Could not switch to {}: {}", tier, e).red()
            ),
        }
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(session: &ChatSession) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║        {:<54}║", session.config().server.title);
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Dataset: {} ({} rows, {} columns)",
            session.config().data.dataset_path.display(),
            session.frame().row_count(),
            session.frame().columns().len()
        );
        println!(
            "Tier:    {} {} ({})\n",
            session.tier().colored_tag(),
            session.model(),
            session.tier().description()
        );
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display tier, model, dataset and conversation size
    fn print_status_display(session: &ChatSession) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     askcsv Session Status                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Model Tier:        {} ({})",
            session.tier().colored_tag(),
            session.tier().description()
        );
        println!("Model:             {}", session.model());
        println!(
            "Dataset:           {}",
            session.config().data.dataset_path.display()
        );
        println!(
            "Shape:             {} rows x {} columns",
            session.frame().row_count(),
            session.frame().columns().len()
        );
        println!("Conversation Size: {} messages", session.transcript().len());
        println!("Answered:          {} questions", session.usage_records().len());
        println!();
    }

    /// Print usage for the questions answered in this session
    fn print_session_usage(session: &ChatSession) {
        let records = session.usage_records();
        if records.is_empty() {
            println!("No questions answered yet\n");
            return;
        }

        for record in records {
            println!("  {}", record.summary_line().dimmed());
        }
        println!();
        crate::commands::usage::summary_table(&summarize(records)).printstd();
        println!();
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::test_utils::test_config;

        #[tokio::test]
        async fn test_run_chat_missing_dataset_fails() {
            let mut cfg = test_config();
            cfg.data.dataset_path = "/nonexistent/askcsv/data.csv".into();

            let res = run_chat(cfg, None).await;
            assert!(res.is_err());
        }

        #[tokio::test]
        async fn test_run_chat_unknown_provider_fails() {
            let temp = crate::test_utils::temp_dir();
            let path =
                crate::test_utils::create_test_file(&temp, "data.csv", crate::test_utils::SAMPLE_CSV);
            let mut cfg = test_config();
            cfg.data.dataset_path = path;
            cfg.data.dictionary_path = temp.path().join("missing.txt");
            cfg.provider.provider_type = "invalid_provider".to_string();

            let res = run_chat(cfg, None).await;
            assert!(res.is_err());
        }
    }
}

/// One-shot question command
pub mod ask {
    use super::*;
    use crate::error::AskCsvError;
    use crate::session::Answer;

    /// Answer a single question and print it
    ///
    /// With `json`, prints `{"answer": ..., "usage": {...}}`; otherwise the
    /// answer followed by the usage line on stderr.
    pub async fn run_ask(
        config: Config,
        question: String,
        tier: Option<ModelTier>,
        json: bool,
    ) -> Result<()> {
        let factory = config_factory(&config);
        let answer = ask_with_factory(config, factory, &question, tier).await?;

        if json {
            let json =
                serde_json::to_string_pretty(&answer).map_err(AskCsvError::Serialization)?;
            println!("{}", json);
        } else {
            println!("{}", answer.content);
            eprintln!("{}", answer.usage.summary_line());
        }
        Ok(())
    }

    /// Build a session and ask one question
    pub(crate) async fn ask_with_factory(
        config: Config,
        factory: Arc<dyn ProviderFactory>,
        question: &str,
        tier: Option<ModelTier>,
    ) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(AskCsvError::EmptyQuestion.into());
        }
        let mut session = ChatSession::from_config(config, factory, tier)?;
        session.ask(question).await
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::providers::{Message, TokenUsage};
        use crate::test_utils::{
            create_test_file, temp_dir, test_config, MockProviderFactory, SAMPLE_CSV,
        };

        #[tokio::test]
        async fn test_ask_with_factory_uses_requested_tier() {
            let temp = temp_dir();
            let mut cfg = test_config();
            cfg.data.dataset_path = create_test_file(&temp, "data.csv", SAMPLE_CSV);
            cfg.data.dictionary_path = temp.path().join("missing.txt");

            let factory = MockProviderFactory::new(vec![Message::assistant("42 rows")])
                .with_usage(TokenUsage::new(100, 10));
            let answer = ask_with_factory(
                cfg.clone(),
                Arc::new(factory.clone()),
                "How many rows?",
                Some(ModelTier::Accurate),
            )
            .await
            .unwrap();

            assert_eq!(answer.content, "42 rows");
            assert_eq!(answer.usage.model, cfg.models.accurate);
            assert_eq!(answer.usage.tier, ModelTier::Accurate);
            assert_eq!(factory.created_models(), vec![cfg.models.accurate.clone()]);
        }

        #[tokio::test]
        async fn test_ask_with_factory_rejects_blank_question() {
            let factory = MockProviderFactory::new(vec![]);
            let err = ask_with_factory(test_config(), Arc::new(factory.clone()), "   ", None)
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<AskCsvError>(),
                Some(AskCsvError::EmptyQuestion)
            ));
            assert!(factory.created_models().is_empty());
        }
    }
}

/// Web UI command
pub mod serve {
    use super::*;

    /// Serve the chat web UI until Ctrl-C
    ///
    /// `host` and `port` override the `server` section of the config.
    pub async fn run_serve(
        mut config: Config,
        host: Option<String>,
        port: Option<u16>,
        tier: Option<ModelTier>,
    ) -> Result<()> {
        if let Some(host) = host {
            config.server.host = host;
        }
        if let Some(port) = port {
            config.server.port = port;
        }

        let server = config.server.clone();
        let factory = config_factory(&config);
        let session = ChatSession::from_config(config, factory, tier)?;
        tracing::info!(
            "Serving {} rows on {} ({})",
            session.frame().row_count(),
            session.tier(),
            session.model()
        );
        crate::web::serve(&server, session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_transcript_labels_roles() {
        colored::control::set_override(false);
        let entries = vec![
            TranscriptEntry::user("How many rows?"),
            TranscriptEntry::assistant("There are 6 rows."),
        ];
        let out = format_transcript(&entries);
        assert_eq!(out, "You: How many rows?\n\nAssistant: There are 6 rows.\n\n");
    }

    #[test]
    fn test_format_transcript_empty() {
        assert_eq!(format_transcript(&[]), "");
    }
}
