use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::AuthorizeError;

/// Token endpoint errors. Every authentication or authorization failure
/// renders the same 401 body.
#[derive(Debug)]
pub enum TokenError {
    Unauthorized,
    Internal(anyhow::Error),
}

impl From<AuthorizeError> for TokenError {
    fn from(err: AuthorizeError) -> Self {
        match err {
            AuthorizeError::Unauthorized => TokenError::Unauthorized,
            AuthorizeError::Store(e) => TokenError::Internal(e),
        }
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        match self {
            TokenError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "unauthorized" })),
            )
                .into_response(),
            TokenError::Internal(err) => {
                tracing::error!(error = ?err, "token endpoint failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
