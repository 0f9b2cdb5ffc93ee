// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Collaborators are passed at construction (constructor injection), never
// looked up through a registry.
//
// Naming convention: Base* for trait names (e.g., BaseBookStore, BaseNotifier)

use anyhow::Result;
use async_trait::async_trait;

use crate::domains::books::models::{Book, NewBook};

// =============================================================================
// Record Store Trait (Infrastructure)
// =============================================================================

/// Durable keyed storage for book records.
///
/// Query execution is the store's own concern; the service layer only relies
/// on this narrow surface. Concurrent writes to the same id resolve at the
/// store's discretion (last write wins) - no record-level locking here.
#[async_trait]
pub trait BaseBookStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>>;

    async fn find_all(&self) -> Result<Vec<Book>>;

    /// Case-insensitive substring match on title.
    async fn find_by_title_contains(&self, title: &str) -> Result<Vec<Book>>;

    /// Case-insensitive substring match on author.
    async fn find_by_author_contains(&self, author: &str) -> Result<Vec<Book>>;

    /// Case-insensitive substring match on both fields (intersection).
    async fn find_by_title_and_author_contains(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Vec<Book>>;

    /// Persist a new record and assign its identity.
    async fn insert(&self, book: NewBook) -> Result<Book>;

    /// Persist changes to an existing record, returning the stored row.
    async fn save(&self, book: &Book) -> Result<Book>;

    async fn delete(&self, book: &Book) -> Result<()>;
}

// =============================================================================
// Notifier Trait (Infrastructure)
// =============================================================================

/// Delivers a message to a recipient address.
///
/// Delivery failures are non-fatal to callers; the service layer wraps every
/// call in `best_effort`. Rendering of templated messages happens inside the
/// implementation, not here.
#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Send a plain-text message.
    async fn send_plain(&self, to: &str, subject: &str, body: &str) -> Result<()>;

    /// Send a templated message. `model` carries the template variables; the
    /// template selector is passed through as stored, absent included - the
    /// gateway decides what an absent selector means.
    async fn send_templated(
        &self,
        to: &str,
        subject: &str,
        template: Option<&str>,
        body: &str,
        model: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<()>;
}
