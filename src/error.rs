use thiserror::Error;

/// Outcome of a failed token authorization.
///
/// Every validation failure collapses into `Unauthorized` so callers cannot
/// tell which check rejected the request.
#[derive(Debug, Error)]
pub enum AuthorizeError {
    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
