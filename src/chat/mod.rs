//! Interactive decision-assistant module.
//!
//! This module provides the REPL front-end built on top of the decidr client
//! library. It supports:
//!
//! - A decision context injected into the system prompt on every request
//! - Example scenarios and decision tips for getting started
//! - Slash commands for session control
//! - Cancelling an in-flight request with Ctrl+C
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Per-session conversation state
//! - [`reducer`]: Actions, transitions, and the dispatcher that runs them
//! - [`commands`]: Slash command parsing and handling
//! - [`render`]: Re-rendering the session after each command

mod commands;
mod config;
mod reducer;
mod render;
mod scenarios;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use reducer::{
    Action, DECISION_SEED_PREFIX, Dispatcher, Effect, Notice, NoticeLevel, PendingQuery,
    SUBMIT_FAILURE_NOTICE, abandon, reduce, resolve,
};
pub use render::{
    CONTEXT_PLACEHOLDER, DECISION_TIPS, FOOTER, PlainTextRenderer, Renderer,
};
pub use scenarios::Scenario;
pub use session::{Session, SessionPhase};
