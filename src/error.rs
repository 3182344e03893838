//! Error type shared by the store and the renderers.

use thiserror::Error;

use crate::pdf::RenderError;

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The underlying SQLite call failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// No certificate exists with the given id.
    #[error("certificate {0} not found")]
    NotFound(i64),
    /// The certificate already carries a revocation.
    #[error("certificate {0} is already revoked")]
    AlreadyRevoked(i64),
    /// Revocations must state a reason.
    #[error("a revocation reason is required")]
    MissingReason,
    /// A PDF could not be produced.
    #[error(transparent)]
    Render(#[from] RenderError),
}
