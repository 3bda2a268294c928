//! Request-local error shaping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mailbin_core::Error as StoreError;
use thiserror::Error;

/// Errors surfaced to API clients.
///
/// Store errors carry their structured kind through to the response
/// mapper, so "not found" and storage malfunction produce distinct
/// status codes while the underlying error text is preserved.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request was malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The response could not be constructed.
    #[error("{0}")]
    Internal(String),

    /// The message store reported an error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::Store(
                err @ (StoreError::MessageNotFound(_) | StoreError::PartNotFound { .. }),
            ) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Store(err) => {
                tracing::error!(%err, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, body).into_response()
    }
}
