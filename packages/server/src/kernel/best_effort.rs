//! Best-effort execution of fan-out side effects.
//!
//! Publish and notification calls after a committed mutation must never
//! change the mutation's outcome. Wrapping them here makes that contract a
//! named function instead of scattered catch-and-log blocks.

use std::future::Future;

/// Run a fallible side effect, logging and discarding any error.
///
/// Returns `Some(value)` on success, `None` on failure. The enclosing
/// operation continues either way.
pub async fn best_effort<T, F>(label: &str, fut: F) -> Option<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::error!(error = %error, "{} failed", label);
            None
        }
    }
}
