use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GalleryError>;

/// Gallery errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Remote store answered with a non-success status
    #[error("Remote store error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Remote store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote store answered with a body we could not use
    #[error("Malformed response from remote store: {0}")]
    MalformedResponse(String),

    /// Local filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    /// If Some(message), the message can be shown to the client
    /// If None, details must not leak
    #[error("Internal server error")]
    Internal(Option<String>),
}

impl GalleryError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).ok().filter(|s| !s.is_success()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Connection(_) | Self::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            Self::Io { .. } | Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string for the response
    pub fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Upstream { .. } | Self::Connection(_) | Self::MalformedResponse(_) => "upstream_error",
            Self::Io { .. } => "storage_error",
            Self::Config(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to expose to API consumers
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(Some(message)) => message.clone(),
            Self::Internal(None) | Self::Config(_) => "Internal server error".to_string(),
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => "File not found".to_string(),
            Self::Io { .. } => "Local storage error".to_string(),
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: String,
    code: u16,
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "gallery request failed");
        }

        let error_response = ErrorResponse {
            error: ErrorDetails {
                message: self.client_message(),
                r#type: self.error_type().to_string(),
                code: status.as_u16(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}
