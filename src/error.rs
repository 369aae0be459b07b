//! Error types for decidr.
//!
//! Every failure the assistant can hit falls into one of a few classes: the
//! credential is missing (configuration), the request never produced a usable
//! HTTP response (transport), or the response body was not the shape we need
//! (response parse).  The orchestrator recovers all of them into notices; none
//! of them end the session.

use std::error;
use std::fmt;
use std::sync::Arc;

/// The main error type for decidr.
#[derive(Clone, Debug)]
pub enum Error {
    /// The bearer token or another local setting is missing or unusable.
    Configuration {
        /// Human-readable error message.
        message: String,
        /// What the user should do to fix it, if known.
        remediation: Option<String>,
    },

    /// The request failed on the wire or the server answered with a non-2xx status.
    Transport {
        /// Human-readable error message.
        message: String,
        /// HTTP status code, when the server answered at all.
        status_code: Option<u16>,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The response body was not JSON or lacked the reply text.
    ResponseParse {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Another request for the same session is still in flight.
    Busy,
}

impl Error {
    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>, remediation: Option<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            remediation,
        }
    }

    /// Creates a new transport error.
    pub fn transport(
        message: impl Into<String>,
        status_code: Option<u16>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Transport {
            message: message.into(),
            status_code,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new response parse error.
    pub fn response_parse(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::ResponseParse {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new busy error.
    pub fn busy() -> Self {
        Error::Busy
    }

    /// Returns true if this error is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    /// Returns true if this error is a transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Returns true if this error is a response parse error.
    pub fn is_response_parse(&self) -> bool {
        matches!(self, Error::ResponseParse { .. })
    }

    /// Returns true if this error is a busy error.
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy)
    }

    /// Returns the HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Transport { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Returns the remediation text for configuration errors.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Error::Configuration { remediation, .. } => remediation.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message, .. } => {
                write!(f, "Configuration error: {message}")
            }
            Error::Transport {
                message,
                status_code,
                ..
            } => {
                if let Some(status_code) = status_code {
                    write!(f, "API request failed: {message} (HTTP {status_code})")
                } else {
                    write!(f, "API request failed: {message}")
                }
            }
            Error::ResponseParse { message, .. } => {
                write!(f, "Failed to parse API response: {message}")
            }
            Error::Busy => {
                write!(f, "A request is already in flight for this session")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Transport { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::ResponseParse { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::response_parse(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for decidr operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn configuration_carries_remediation() {
        let err = Error::configuration("HF_TOKEN not found", Some("set it".to_string()));
        assert!(err.is_configuration());
        assert_eq!(err.remediation(), Some("set it"));
        assert_eq!(err.to_string(), "Configuration error: HF_TOKEN not found");
    }

    #[test]
    fn transport_display_includes_status() {
        let err = Error::transport("Service Unavailable", Some(503), None);
        assert!(err.is_transport());
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(
            err.to_string(),
            "API request failed: Service Unavailable (HTTP 503)"
        );

        let err = Error::transport("connection refused", None, None);
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "API request failed: connection refused");
    }

    #[test]
    fn json_errors_become_response_parse() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = Error::from(json_err);
        assert!(err.is_response_parse());
        assert!(err.source().is_some());
        assert!(err.remediation().is_none());
    }

    #[test]
    fn busy_is_distinct() {
        let err = Error::busy();
        assert!(err.is_busy());
        assert!(!err.is_transport());
        assert!(!err.is_configuration());
    }
}
