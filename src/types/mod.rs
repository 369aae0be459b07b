// Public modules
pub mod chat_message;
pub mod completion;
pub mod model;

// Re-exports
pub use chat_message::{ChatMessage, Role};
pub use completion::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage, CompletionUsage,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use model::{KnownModel, Model};
