//! Logging trait for chat-completions client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`ChatClient`](crate::ChatClient),
//! and [`JsonLinesLogger`], which appends each interaction to a file as one
//! JSON object per line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use serde_json::json;

use crate::error::{Error, Result};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse};

/// A trait for logging client operations.
///
/// The bearer token is never passed to the logger.
///
/// # Example
///
/// ```rust,ignore
/// use decidr::{ChatCompletionRequest, ChatCompletionResponse, ClientLogger, Error};
///
/// struct CountingLogger(std::sync::atomic::AtomicUsize);
///
/// impl ClientLogger for CountingLogger {
///     fn log_request(&self, _: &ChatCompletionRequest) {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     }
///     fn log_response(&self, _: &ChatCompletionResponse) {}
///     fn log_error(&self, _: &Error) {}
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request body just before it is sent.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log a successfully parsed response.
    fn log_response(&self, response: &ChatCompletionResponse);

    /// Log a failed call.
    fn log_error(&self, error: &Error);
}

/// Appends one JSON object per client event to a file.
pub struct JsonLinesLogger {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesLogger {
    /// Opens `path` for appending, creating it if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                Error::configuration(
                    format!("failed to open log file {}: {err}", path.display()),
                    None,
                )
            })?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_event(&self, event: serde_json::Value) {
        // A poisoned or failing log must never fail the request it describes.
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if serde_json::to_writer(&mut *writer, &event).is_ok() {
            _ = writer.write_all(b"\n");
            _ = writer.flush();
        }
    }
}

impl ClientLogger for JsonLinesLogger {
    fn log_request(&self, request: &ChatCompletionRequest) {
        self.write_event(json!({"event": "request", "body": request}));
    }

    fn log_response(&self, response: &ChatCompletionResponse) {
        self.write_event(json!({"event": "response", "body": response}));
    }

    fn log_error(&self, error: &Error) {
        self.write_event(json!({
            "event": "error",
            "message": error.to_string(),
            "status_code": error.status_code(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMessage, Model};

    #[test]
    fn writes_one_line_per_event() {
        let dir = std::env::temp_dir().join(format!("decidr-log-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("client.jsonl");
        let _ = std::fs::remove_file(&path);

        let logger = JsonLinesLogger::create(&path).unwrap();
        logger.log_request(&ChatCompletionRequest::new(
            vec![ChatMessage::user("hi")],
            Model::default(),
        ));
        logger.log_error(&Error::transport("Bad Gateway", Some(502), None));
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "request");
        assert_eq!(lines[0]["body"]["max_tokens"], 500);
        assert_eq!(lines[1]["event"], "error");
        assert_eq!(lines[1]["status_code"], 502);
    }
}
