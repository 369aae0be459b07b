use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_CONFIGURATION_ERRORS, CLIENT_PARSE_ERRORS, CLIENT_REQUEST_DURATION,
    CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::secrets::{BearerToken, CredentialProvider};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Model};

/// Chat-completions endpoint of the Hugging Face inference router.
pub const DEFAULT_API_URL: &str = "https://router.huggingface.co/v1/chat/completions";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that can answer a list of messages with a completion.
///
/// [`ChatClient`] is the HTTP implementation; the orchestrator is generic over
/// this trait so it can run against a scripted backend.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends `messages` to `model` and returns the parsed response.
    ///
    /// Exactly one attempt is made.  The messages are passed through as given;
    /// the remote service is responsible for rejecting malformed input.
    async fn query(&self, messages: &[ChatMessage], model: &Model)
    -> Result<ChatCompletionResponse>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatClient {
    credentials: Arc<dyn CredentialProvider>,
    client: ReqwestClient,
    endpoint: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl ChatClient {
    /// Create a new client against [`DEFAULT_API_URL`] with [`DEFAULT_TIMEOUT`].
    pub fn new(credentials: impl CredentialProvider + 'static) -> Result<Self> {
        Self::with_options(credentials, None, Some(DEFAULT_TIMEOUT))
    }

    /// Create a new client with custom settings.
    ///
    /// A `timeout` of `None` leaves requests unbounded.
    pub fn with_options(
        credentials: impl CredentialProvider + 'static,
        endpoint: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let endpoint = endpoint.unwrap_or(DEFAULT_API_URL);
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::configuration(
                format!("invalid endpoint {endpoint:?}: {e}"),
                Some("Pass an absolute http(s) URL with --endpoint.".to_string()),
            )
        })?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::transport(
                format!("Failed to build HTTP client: {}", e),
                None,
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            credentials: Arc::new(credentials),
            client,
            endpoint,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request, response and error.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Headers for one request.  The token is resolved by the caller for every call.
    fn headers(&self, token: &BearerToken) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|_| {
                Error::configuration(
                    "HF_TOKEN contains characters that cannot be sent in a header",
                    None,
                )
            })?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);
        Ok(headers)
    }

    /// Turn a non-2xx response into a transport error carrying the server's message.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("request failed");
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::transport(
                    format!("{reason}; failed to read error response: {e}"),
                    Some(status.as_u16()),
                    Some(Box::new(e)),
                );
            }
        };
        let message = error_message_from_body(&body)
            .map(|detail| format!("{reason}: {detail}"))
            .unwrap_or_else(|| reason.to_string());
        Error::transport(message, Some(status.as_u16()), None)
    }

    /// Send a request and parse the response body.
    pub async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let result = self.send_inner(request).await;
        match &result {
            Ok(response) => {
                if let Some(logger) = &self.logger {
                    logger.log_response(response);
                }
            }
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                if err.is_configuration() {
                    CLIENT_CONFIGURATION_ERRORS.click();
                } else if err.is_response_parse() {
                    CLIENT_PARSE_ERRORS.click();
                }
                if let Some(logger) = &self.logger {
                    logger.log_error(err);
                }
            }
        }
        result
    }

    async fn send_inner(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let token = self.credentials.get_credentials()?;
        let headers = self.headers(&token)?;

        if let Some(logger) = &self.logger {
            logger.log_request(request);
        }
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::transport(format!("Request timed out: {}", e), None, Some(Box::new(e)))
                } else if e.is_connect() {
                    Error::transport(format!("Connection error: {}", e), None, Some(Box::new(e)))
                } else {
                    Error::transport(format!("Request failed: {}", e), None, Some(Box::new(e)))
                }
            });
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        let response = response?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            Error::transport(
                format!("Failed to read response body: {}", e),
                Some(status),
                Some(Box::new(e)),
            )
        })?;
        serde_json::from_str::<ChatCompletionResponse>(&body).map_err(|e| {
            Error::response_parse(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for ChatClient {
    async fn query(
        &self,
        messages: &[ChatMessage],
        model: &Model,
    ) -> Result<ChatCompletionResponse> {
        let request = ChatCompletionRequest::new(messages.to_vec(), model.clone());
        self.send(&request).await
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// Pull a human-readable message out of an error body.
///
/// Routers answer with either `{"error": "text"}` or
/// `{"error": {"message": "text", ...}}`; anything else falls back to the raw
/// body when it is short enough to show.
fn error_message_from_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let error = value.get("error").unwrap_or(&value);
        if let Some(text) = error.as_str() {
            return Some(text.to_string());
        }
        if let Some(text) = error.get("message").and_then(|m| m.as_str()) {
            return Some(text.to_string());
        }
    }
    if body.len() <= 200 {
        Some(body.to_string())
    } else {
        None
    }
}
