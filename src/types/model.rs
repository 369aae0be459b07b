use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a chat-completions model identifier.
///
/// This can be a model the assistant has been tuned against or a custom
/// string for anything else the router serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model identifiers
    Known(KnownModel),

    /// Custom model identifier (any other model the router accepts)
    Custom(String),
}

/// Known model identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Qwen3 VL 8B Instruct served by Novita (the default)
    #[serde(rename = "Qwen/Qwen3-VL-8B-Instruct:novita")]
    Qwen3Vl8bInstructNovita,

    /// Llama 3.1 8B Instruct served by Fireworks
    #[serde(rename = "accounts/fireworks/models/llama-v3p1-8b-instruct")]
    Llama31_8bInstructFireworks,
}

impl KnownModel {
    /// All known models, default first.
    pub const ALL: [KnownModel; 2] = [
        KnownModel::Qwen3Vl8bInstructNovita,
        KnownModel::Llama31_8bInstructFireworks,
    ];

    /// The identifier sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Qwen3Vl8bInstructNovita => "Qwen/Qwen3-VL-8B-Instruct:novita",
            KnownModel::Llama31_8bInstructFireworks => {
                "accounts/fireworks/models/llama-v3p1-8b-instruct"
            }
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::Qwen3Vl8bInstructNovita)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnownModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownModel::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| format!("unknown model: {s}"))
    }
}

impl FromStr for Model {
    type Err = String;

    /// Parses a known model identifier.
    ///
    /// Unknown identifiers are an error; callers that accept arbitrary models
    /// fall back to [`Model::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<KnownModel>().map(Model::Known)
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}
