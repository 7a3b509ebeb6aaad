use axum::{http::StatusCode, Json};
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match &err {
            FetchError::Validation(message) => Self::bad_request(message.clone()),
            FetchError::Status { status: 404, .. } => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            _ => Self::bad_gateway(err.to_string()),
        }
    }
}

impl From<AggregateError> for AppError {
    fn from(err: AggregateError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        } else {
            warn!(status = %self.status, message = %self.message, "request rejected");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Failure of a single call to the backend API.
#[derive(Debug)]
pub enum FetchError {
    /// Rejected before any request was sent.
    Validation(String),
    Transport(reqwest::Error),
    Status { status: u16, message: String },
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Validation(msg) => write!(f, "invalid request: {msg}"),
            FetchError::Transport(e) if e.is_timeout() => write!(f, "backend timed out: {e}"),
            FetchError::Transport(e) => write!(f, "backend unreachable: {e}"),
            FetchError::Status { status, message } => {
                write!(f, "backend responded with {status}: {message}")
            }
            FetchError::Decode(msg) => write!(f, "malformed backend payload: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e)
        }
    }
}

/// Input the aggregator refuses to fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    NegativeCount { id: String, field: &'static str, value: i64 },
    Overflow { field: &'static str },
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateError::NegativeCount { id, field, value } => {
                write!(f, "{id}: {field} must be non-negative, got {value}")
            }
            AggregateError::Overflow { field } => write!(f, "sum of {field} overflowed"),
        }
    }
}

impl std::error::Error for AggregateError {}
