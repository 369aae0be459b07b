//! Credential loading.
//!
//! The bearer token lives in a local YAML secrets file keyed by `HF_TOKEN`,
//! with the environment variable of the same name as a fallback.  It is
//! resolved on every request and never cached, so editing the file takes
//! effect on the next message.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Key that holds the bearer token.
pub const TOKEN_KEY: &str = "HF_TOKEN";

/// Default location of the secrets file, relative to the working directory.
pub const DEFAULT_SECRETS_PATH: &str = ".decidr/secrets.yaml";

/// A bearer token.  Its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Resolves the bearer token for a request.
pub trait CredentialProvider: Send + Sync {
    /// Returns the bearer token, or a configuration error naming how to set it.
    fn get_credentials(&self) -> Result<BearerToken>;
}

impl CredentialProvider for BearerToken {
    fn get_credentials(&self) -> Result<BearerToken> {
        if self.0.is_empty() {
            return Err(Error::configuration(
                format!("{TOKEN_KEY} is empty"),
                Some(format!("Provide a non-empty {TOKEN_KEY}.")),
            ));
        }
        Ok(self.clone())
    }
}

/// File-backed secrets store with an optional environment fallback.
#[derive(Debug, Clone)]
pub struct SecretsStore {
    path: PathBuf,
    env_key: Option<String>,
}

impl SecretsStore {
    /// Creates a store reading `path`, falling back to the `HF_TOKEN` environment variable.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_key: Some(TOKEN_KEY.to_string()),
        }
    }

    /// Creates a store at [`DEFAULT_SECRETS_PATH`].
    pub fn default_location() -> Self {
        Self::new(DEFAULT_SECRETS_PATH)
    }

    /// Sets the environment variable consulted when the file has no token.
    /// `None` disables the fallback.
    pub fn with_env_fallback(mut self, env_key: Option<String>) -> Self {
        self.env_key = env_key;
        self
    }

    /// Returns the secrets file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Text telling the user what key to set and where.
    pub fn remediation(&self) -> String {
        let mut text = format!(
            "Add the following to your {} file:\n\n{TOKEN_KEY}: \"your_token_here\"",
            self.path.display()
        );
        if let Some(env_key) = &self.env_key {
            text.push_str(&format!("\n\nor export {env_key} in your environment."));
        }
        text
    }

    fn read_file(&self) -> Result<Option<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::configuration(
                    format!("failed to read {}: {err}", self.path.display()),
                    Some(self.remediation()),
                ));
            }
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let secrets: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(&content)
            .map_err(|err| {
                Error::configuration(
                    format!("failed to parse {}: {err}", self.path.display()),
                    Some(self.remediation()),
                )
            })?;
        Ok(secrets
            .get(TOKEN_KEY)
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from))
    }

    fn read_env(&self) -> Option<String> {
        let key = self.env_key.as_deref()?;
        std::env::var(key)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

impl Default for SecretsStore {
    fn default() -> Self {
        Self::default_location()
    }
}

impl CredentialProvider for SecretsStore {
    fn get_credentials(&self) -> Result<BearerToken> {
        if let Some(token) = self.read_file()? {
            return Ok(BearerToken::new(token));
        }
        if let Some(token) = self.read_env() {
            return Ok(BearerToken::new(token));
        }
        Err(Error::configuration(
            format!(
                "{TOKEN_KEY} not found in {}. Please add it to your secrets.",
                self.path.display()
            ),
            Some(self.remediation()),
        ))
    }
}
