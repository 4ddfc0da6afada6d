use crate::config::ValidationError;
use http::StatusCode;
use thiserror::Error;

/// Errors that can occur while serving a batch lookup
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(http::Method),

    #[error("Invalid format: {0}")]
    InvalidRequest(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Unexpected payload from {0}: {1}")]
    UpstreamPayload(String, String),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LookupError {
    /// Status code reported to the caller when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            LookupError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
