//! Mapping of failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use fsic_registry::RegistryError;
use thiserror::Error;
use tracing::error;

/// Where callers without a user are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where non-admin users are sent.
pub const UNAUTHORIZED_PATH: &str = "/login/unauthorized";

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no authenticated user")]
    Unauthenticated,
    #[error("user {0} may not manage certificates")]
    Forbidden(i64),
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("certificate store lock poisoned")]
    StorePoisoned,
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
            Self::Forbidden(_) => Redirect::to(UNAUTHORIZED_PATH).into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Registry(RegistryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Certificate not found").into_response()
            }
            Self::Registry(RegistryError::MissingReason) => (
                StatusCode::BAD_REQUEST,
                "A reason is required to revoke a certificate",
            )
                .into_response(),
            Self::Registry(RegistryError::AlreadyRevoked(_)) => {
                (StatusCode::CONFLICT, "Certificate is already revoked").into_response()
            }
            other => {
                error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
