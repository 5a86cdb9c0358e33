use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExtractionError {
    pub message: String,
}

impl ExtractionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data not yet processed (records store not found)")]
    NotProcessed,
    /// The store holds an error indicator; carries its message verbatim.
    #[error("{0}")]
    Unavailable(String),
    #[error("malformed records store: {0}")]
    Malformed(String),
    #[error("records store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("internal error processing stored document. Detail: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotProcessed => Self::ServiceUnavailable(err.to_string()),
            StoreError::Unavailable(message) => Self::ServiceUnavailable(message),
            StoreError::Malformed(detail) => Self::Internal(detail),
            StoreError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API answered {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("no data available: {0}")]
    ServiceUnavailable(String),
    #[error("could not decode API response: {0}")]
    Decode(String),
}

/// A field that failed to parse; the row survives with a sentinel value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    pub row: usize,
    pub field: String,
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} field {} ({}): {}",
            self.row, self.field, self.value, self.reason
        )
    }
}
