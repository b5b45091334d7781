use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga_auth::AuthError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the HTTP handlers.
///
/// Internal detail is logged where the error is raised; the body only
/// carries the public message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("The request timed out.")]
    Timeout,

    #[error("An error occurred.")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::Unauthorized("Missing bearer token.".to_string()),
            AuthError::InvalidPassword => ApiError::Unauthorized("Invalid password.".to_string()),
            AuthError::InvalidToken(_) | AuthError::MissingClaim { .. } => {
                ApiError::Forbidden("Invalid or expired token.".to_string())
            }
            AuthError::InvalidKey(_) | AuthError::TokenCreationFailed(_) => ApiError::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
