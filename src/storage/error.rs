//! Storage errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("invalid name {0:?}")]
    InvalidName(String),

    #[error("repository is append-only")]
    AppendOnly,

    #[error("repository has reached its maximum size of {0} bytes")]
    QuotaExceeded(u64),

    #[error("request body exceeds the upload limit")]
    PayloadTooLarge,

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn status(&self) -> StatusCode {
        match self {
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::AlreadyExists(_) | StorageError::AppendOnly => StatusCode::FORBIDDEN,
            StorageError::InvalidName(_) | StorageError::Body(_) => StatusCode::BAD_REQUEST,
            StorageError::QuotaExceeded(_) | StorageError::PayloadTooLarge => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Storage request failed");
            return status.into_response();
        }
        tracing::debug!(error = %self, status = %status, "Storage request rejected");
        (status, self.to_string()).into_response()
    }
}
