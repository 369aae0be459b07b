//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::secrets::DEFAULT_SECRETS_PATH;
use crate::types::Model;

/// Command-line arguments for the decidr-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: Qwen/Qwen3-VL-8B-Instruct:novita)", "MODEL")]
    pub model: Option<String>,

    /// Decision context to start with.
    #[arrrg(optional, "Decision you are trying to make", "TEXT")]
    pub context: Option<String>,

    /// Path to the YAML secrets file.
    #[arrrg(optional, "Secrets file holding HF_TOKEN (default: .decidr/secrets.yaml)", "PATH")]
    pub secrets: Option<String>,

    /// Chat-completions endpoint.
    #[arrrg(optional, "Chat-completions endpoint URL", "URL")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds; zero disables it.
    #[arrrg(optional, "Request timeout in seconds, 0 for none (default: 60)", "SECS")]
    pub timeout: Option<u64>,

    /// File to append request/response logs to.
    #[arrrg(optional, "Append JSON request/response logs to this file", "PATH")]
    pub log_file: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Decision context applied before the first prompt.
    pub initial_context: Option<String>,

    /// Where the bearer token is read from.
    pub secrets_path: PathBuf,

    /// Chat-completions endpoint.
    pub endpoint: String,

    /// Request timeout.  `None` means no timeout.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Optional JSON-lines log of client traffic.
    pub log_file: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: Qwen/Qwen3-VL-8B-Instruct:novita
    /// - Secrets: .decidr/secrets.yaml
    /// - Endpoint: the Hugging Face router
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            initial_context: None,
            secrets_path: PathBuf::from(DEFAULT_SECRETS_PATH),
            endpoint: DEFAULT_API_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            use_color: true,
            log_file: None,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the initial decision context.
    pub fn with_initial_context(mut self, context: String) -> Self {
        self.initial_context = Some(context);
        self
    }

    /// Sets the secrets file path.
    pub fn with_secrets_path(mut self, path: PathBuf) -> Self {
        self.secrets_path = path;
        self
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the client log file.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let model = args
            .model
            .map(|s| s.parse::<Model>().unwrap_or(Model::Custom(s)))
            .unwrap_or_default();
        let timeout = match args.timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        };

        ChatConfig {
            model,
            initial_context: args.context.filter(|c| !c.is_empty()),
            secrets_path: args
                .secrets
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_PATH)),
            endpoint: args.endpoint.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout,
            use_color: !args.no_color,
            log_file: args.log_file.map(PathBuf::from),
        }
    }
}
