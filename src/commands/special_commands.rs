//! Special commands parser for interactive chat mode
//!
//! Special commands change the session instead of being sent to the agent:
//! - Switch between the fast and accurate model tiers
//! - Show the transcript, usage, and session status
//! - Clear the transcript
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive.

use crate::model_tier::ModelTier;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Switch to a model tier
    SwitchTier(ModelTier),

    /// Print the transcript so far
    ShowHistory,

    /// Print token usage and cost for this session
    ShowUsage,

    /// Display tier, model and dataset status
    ShowStatus,

    /// Clear the transcript
    Clear,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the agent as a question.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is
/// not a valid command, `UnsupportedArgument` for a bad tier name and
/// `MissingArgument` for `/tier` without a tier.
///
/// # Examples
///
/// ```
/// use askcsv::commands::special_commands::{parse_special_command, SpecialCommand};
/// use askcsv::model_tier::ModelTier;
///
/// assert_eq!(
///     parse_special_command("/accurate").unwrap(),
///     SpecialCommand::SwitchTier(ModelTier::Accurate)
/// );
/// assert_eq!(
///     parse_special_command("How many rows?").unwrap(),
///     SpecialCommand::None
/// );
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Only "exit" and "quit" work without the slash
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/fast" => Ok(SpecialCommand::SwitchTier(ModelTier::Fast)),
        "/accurate" => Ok(SpecialCommand::SwitchTier(ModelTier::Accurate)),

        "/tier" => Err(CommandError::MissingArgument {
            command: "/tier".to_string(),
            usage: "/tier <fast|accurate>".to_string(),
        }),
        input if input.starts_with("/tier ") => {
            let arg = input[6..].trim();
            ModelTier::parse_str(arg)
                .map(SpecialCommand::SwitchTier)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/tier".to_string(),
                    arg: arg.to_string(),
                })
        }

        "/history" => Ok(SpecialCommand::ShowHistory),
        "/usage" => Ok(SpecialCommand::ShowUsage),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/clear" => Ok(SpecialCommand::Clear),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        input => {
            let cmd = input.split_whitespace().next().unwrap_or(input);
            Err(CommandError::UnknownCommand(cmd.to_string()))
        }
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

MODEL TIER:
  /fast              - Use the fast, cheaper model
  /accurate          - Use the accurate, slower model
  /tier <name>       - Same, by name (fast, accurate, cheap, slow)

SESSION INFORMATION:
  /history           - Show the conversation so far
  /usage             - Show token usage and cost for this session
  /status            - Show tier, model and dataset
  /help              - Show this help message
  /?                 - Same as /help

SESSION CONTROL:
  /clear             - Clear the conversation
  exit               - Exit interactive mode
  quit               - Same as exit

NOTES:
  - Commands are case-insensitive
  - Anything else is sent to the agent as a question about the CSV
  - Switching tier rebuilds the agent; the conversation is kept
"#
    );
}
