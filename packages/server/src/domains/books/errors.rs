use thiserror::Error;

/// Errors surfaced by book operations.
///
/// Fan-out failures (bus publish, notification delivery) are never represented
/// here; they are absorbed at the point of occurrence.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("Book not found with ID: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
