//! Change-event fan-out to the message bus.
//!
//! Every committed mutation is announced twice: a human-readable summary on
//! the events subject and the structured event on the books subject. Both
//! sends are attempted on every call; failures are absorbed so the mutation's
//! caller never observes them.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domains::books::models::Book;
use crate::kernel::{best_effort, NatsPublisher};

/// Subject carrying structured change events.
pub const BOOKS_SUBJECT: &str = "books";

/// Subject carrying plain-text summaries.
pub const EVENTS_SUBJECT: &str = "events";

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Update,
    Patch,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Update => "UPDATE",
            ChangeAction::Patch => "PATCH",
            ChangeAction::Delete => "DELETE",
        }
    }
}

/// Structured change event, derived from the record at the moment of
/// mutation. For deletions it carries the pre-deletion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookChangeEvent {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub stock: i32,
    pub action: ChangeAction,
    pub timestamp: String,
}

impl BookChangeEvent {
    pub fn from_book(book: &Book, action: ChangeAction) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price,
            stock: book.stock,
            action,
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Publishes change notifications for book mutations.
pub struct ChangePublisher {
    bus: Arc<dyn NatsPublisher>,
}

impl ChangePublisher {
    pub fn new(bus: Arc<dyn NatsPublisher>) -> Self {
        Self { bus }
    }

    /// Announce a mutation on both subjects.
    ///
    /// No ordering is guaranteed between the two sends, but both are always
    /// attempted - a failure on one never short-circuits the other.
    pub async fn publish_change(&self, book: &Book, action: ChangeAction) {
        let summary = format!("{} Book: {}", action.as_str(), book.title);
        best_effort(
            "publish text summary",
            self.bus
                .publish(EVENTS_SUBJECT.to_string(), Bytes::from(summary)),
        )
        .await;

        let event = BookChangeEvent::from_book(book, action);
        match serde_json::to_vec(&event) {
            Ok(payload) => {
                best_effort(
                    "publish change event",
                    self.bus
                        .publish(BOOKS_SUBJECT.to_string(), Bytes::from(payload)),
                )
                .await;
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to encode change event");
            }
        }

        tracing::info!(
            action = action.as_str(),
            title = %book.title,
            "Change events published"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::TestNats;

    fn book() -> Book {
        Book {
            id: 7,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            price: 19.99,
            stock: 3,
            email: None,
            template_type: None,
            recipient_name: None,
        }
    }

    #[tokio::test]
    async fn publishes_summary_and_structured_event() {
        let nats = Arc::new(TestNats::new());
        let publisher = ChangePublisher::new(nats.clone());

        publisher.publish_change(&book(), ChangeAction::Create).await;

        let summaries = nats.messages_for_subject(EVENTS_SUBJECT);
        assert_eq!(summaries.len(), 1);
        assert_eq!(&summaries[0].payload[..], b"CREATE Book: Dune");

        let events = nats.messages_for_subject(BOOKS_SUBJECT);
        assert_eq!(events.len(), 1);
        let event: BookChangeEvent = nats.deserialize_message(&events[0]).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.action, ChangeAction::Create);
        assert_eq!(event.stock, 3);
    }

    #[tokio::test]
    async fn summary_failure_does_not_skip_structured_send() {
        let nats = Arc::new(TestNats::new());
        nats.fail_subject(EVENTS_SUBJECT);
        let publisher = ChangePublisher::new(nats.clone());

        publisher.publish_change(&book(), ChangeAction::Delete).await;

        assert_eq!(nats.attempted_subjects().len(), 2);
        assert_eq!(nats.publish_count_for(BOOKS_SUBJECT), 1);
        assert_eq!(nats.publish_count_for(EVENTS_SUBJECT), 0);
    }

    #[tokio::test]
    async fn action_serializes_uppercase() {
        let event = BookChangeEvent::from_book(&book(), ChangeAction::Patch);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "PATCH");
    }
}
