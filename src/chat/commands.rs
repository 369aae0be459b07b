//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`.  Some
//! of them map onto session [`Action`]s (the same ones the chat input drives);
//! the rest control the application without touching the conversation.

use crate::chat::reducer::Action;
use crate::chat::scenarios::Scenario;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Set the decision context.  `None` clears it.
    Context(Option<String>),

    /// Start a new decision, optionally setting the context first.
    NewDecision(Option<String>),

    /// Clear the conversation history.
    Clear,

    /// Append one of the example scenarios.
    Example(Scenario),

    /// List the example scenarios.
    Examples,

    /// Show the decision tips.
    Tips,

    /// Re-render the transcript.
    Show,

    /// Change the model.
    Model(String),

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

impl ChatCommand {
    /// Session actions this command stands for, in order.  Empty for commands
    /// that do not touch the session.
    pub fn actions(&self) -> Vec<Action> {
        match self {
            ChatCommand::Context(context) => {
                vec![Action::SetContext(context.clone().unwrap_or_default())]
            }
            ChatCommand::NewDecision(Some(context)) => vec![
                Action::SetContext(context.clone()),
                Action::StartNewDecision,
            ],
            ChatCommand::NewDecision(None) => vec![Action::StartNewDecision],
            ChatCommand::Clear => vec![Action::ClearConversation],
            ChatCommand::Example(scenario) => vec![Action::ExampleClick(*scenario)],
            _ => Vec::new(),
        }
    }
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be sent as a chat message.
///
/// # Examples
///
/// ```
/// # use decidr::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/context Should I rent or buy?").is_some());
/// assert!(parse_command("Should I rent or buy?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "context" => ChatCommand::Context(argument.map(|s| s.to_string())),
        "new" => ChatCommand::NewDecision(argument.map(|s| s.to_string())),
        "clear" => ChatCommand::Clear,
        "example" => match argument {
            Some(arg) => match arg.parse::<Scenario>() {
                Ok(scenario) => ChatCommand::Example(scenario),
                Err(err) => ChatCommand::Invalid(format!("/example: {err}")),
            },
            None => ChatCommand::Invalid("/example requires 1, 2, or 3".to_string()),
        },
        "examples" => ChatCommand::Examples,
        "tips" => ChatCommand::Tips,
        "show" => ChatCommand::Show,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "config" => ChatCommand::ShowConfig,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /context [text]        Set the decision context (no argument clears it)
  /new [context]         Start a new decision from the context
  /clear                 Clear conversation history
  /example <n>           Start from example 1-3 (moving, education, career)
  /examples              List the example scenarios
  /tips                  Show decision-making tips
  /show                  Re-render the conversation
  /model <name>          Change the model
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat
Anything else is sent as a chat message."#
}
