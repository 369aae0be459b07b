//! Decidr: a conversational decision-making assistant.
//!
//! The library forwards a linear conversation, framed by a system prompt built
//! from the user's decision context, to an OpenAI-compatible chat-completions
//! endpoint and folds the replies back into per-session state.  The
//! `decidr-chat` binary puts a terminal REPL on top of it.

// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod prompt;
pub mod secrets;
pub mod types;

// Re-exports
pub use client::{ChatBackend, ChatClient};
pub use client_logger::{ClientLogger, JsonLinesLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use prompt::build_system_prompt;
pub use secrets::{BearerToken, CredentialProvider, SecretsStore};
pub use types::*;
