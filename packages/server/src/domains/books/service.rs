//! Book mutation orchestrator.
//!
//! Coordinates every catalog mutation against the record store, then fans out
//! side effects in a fixed order: persist, publish change events, notify.
//! A committed record stays committed no matter what the fan-out does -
//! publish and notification failures are absorbed, never propagated.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::domains::books::data::BookData;
use crate::domains::books::errors::BookError;
use crate::domains::books::events::{ChangeAction, ChangePublisher};
use crate::domains::books::models::{Book, BookPatch, NewBook};
use crate::kernel::{best_effort, BaseBookStore, BaseNotifier};

pub struct BookService {
    store: Arc<dyn BaseBookStore>,
    events: ChangePublisher,
    notifier: Arc<dyn BaseNotifier>,
}

/// Notification address, when present and non-blank.
fn eligible_email(book: &Book) -> Option<&str> {
    book.email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
}

impl BookService {
    pub fn new(
        store: Arc<dyn BaseBookStore>,
        events: ChangePublisher,
        notifier: Arc<dyn BaseNotifier>,
    ) -> Self {
        Self {
            store,
            events,
            notifier,
        }
    }

    /// Create a book. Input is assumed valid; validation lives upstream.
    pub async fn create(&self, input: NewBook) -> Result<BookData, BookError> {
        info!("Creating book with title: {}", input.title);

        let saved = self.store.insert(input).await?;
        debug!("Book saved with ID: {}", saved.id);

        self.events
            .publish_change(&saved, ChangeAction::Create)
            .await;

        if let Some(email) = eligible_email(&saved) {
            let subject = format!("Book Created: {}", saved.title);
            let body = format!(
                "The book \"{}\" has been added to the library successfully.",
                saved.title
            );
            let mut model = serde_json::Map::new();
            model.insert("name".to_string(), json!(saved.recipient_name));
            model.insert("bookTitle".to_string(), json!(saved.title));

            best_effort(
                "send creation notification",
                self.notifier.send_templated(
                    email,
                    &subject,
                    saved.template_type.as_deref(),
                    &body,
                    &model,
                ),
            )
            .await;
        }

        Ok(saved.into())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<BookData, BookError> {
        let book = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFound(id))?;
        Ok(book.into())
    }

    pub async fn get_all(&self) -> Result<Vec<BookData>, BookError> {
        let books = self.store.find_all().await?;
        Ok(books.into_iter().map(BookData::from).collect())
    }

    /// Filtered search. With both filters the results intersect; with one
    /// filter only that field is matched. With neither filter the result is
    /// empty - deliberately not "return everything".
    pub async fn search(
        &self,
        title: Option<String>,
        author: Option<String>,
    ) -> Result<Vec<BookData>, BookError> {
        let books = match (title, author) {
            (Some(title), Some(author)) => {
                self.store
                    .find_by_title_and_author_contains(&title, &author)
                    .await?
            }
            (Some(title), None) => self.store.find_by_title_contains(&title).await?,
            (None, Some(author)) => self.store.find_by_author_contains(&author).await?,
            (None, None) => Vec::new(),
        };
        Ok(books.into_iter().map(BookData::from).collect())
    }

    /// Full replace of title/author/price/stock. Identity and notification
    /// fields stay as stored.
    pub async fn update(&self, id: i64, input: NewBook) -> Result<BookData, BookError> {
        let mut existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFound(id))?;

        existing.title = input.title;
        existing.author = input.author;
        existing.price = input.price;
        existing.stock = input.stock;

        let updated = self.store.save(&existing).await?;

        self.events
            .publish_change(&updated, ChangeAction::Update)
            .await;

        let subject = format!("Book Updated: {}", updated.title);
        let body = format!(
            "The book \"{}\" has been updated in the library.",
            updated.title
        );
        self.notify_plain(&updated, &subject, &body).await;

        Ok(updated.into())
    }

    /// Partial update. Only fields present in the patch are applied; stock is
    /// applied only when strictly positive (non-positive means "unset").
    pub async fn patch(&self, id: i64, patch: BookPatch) -> Result<BookData, BookError> {
        let mut book = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFound(id))?;

        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(price) = patch.price {
            book.price = price;
        }
        if patch.stock > 0 {
            book.stock = patch.stock;
        }

        let patched = self.store.save(&book).await?;

        self.events
            .publish_change(&patched, ChangeAction::Patch)
            .await;

        let subject = format!("Book Patched: {}", patched.title);
        let body = format!(
            "The book \"{}\" has been patched successfully.",
            patched.title
        );
        self.notify_plain(&patched, &subject, &body).await;

        Ok(patched.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), BookError> {
        let book = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFound(id))?;

        self.store.delete(&book).await?;

        // Event and notification carry the pre-deletion state.
        self.events
            .publish_change(&book, ChangeAction::Delete)
            .await;

        let subject = format!("Book Deleted: {}", book.title);
        let body = format!(
            "The book \"{}\" has been deleted from the library.",
            book.title
        );
        self.notify_plain(&book, &subject, &body).await;

        Ok(())
    }

    async fn notify_plain(&self, book: &Book, subject: &str, body: &str) {
        if let Some(email) = eligible_email(book) {
            best_effort(
                "send notification",
                self.notifier.send_plain(email, subject, body),
            )
            .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::books::events::{BookChangeEvent, BOOKS_SUBJECT, EVENTS_SUBJECT};
    use crate::kernel::{TestBookStore, TestNats, TestNotifier};

    struct Fixture {
        store: Arc<TestBookStore>,
        nats: Arc<TestNats>,
        notifier: Arc<TestNotifier>,
        service: BookService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(TestBookStore::new());
        let nats = Arc::new(TestNats::new());
        let notifier = Arc::new(TestNotifier::new());
        let service = BookService::new(
            store.clone(),
            ChangePublisher::new(nats.clone()),
            notifier.clone(),
        );
        Fixture {
            store,
            nats,
            notifier,
            service,
        }
    }

    fn input(title: &str, author: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            price: 12.50,
            stock: 4,
            email: None,
            template_type: None,
            recipient_name: None,
        }
    }

    fn input_with_email(title: &str, email: &str) -> NewBook {
        NewBook {
            email: Some(email.to_string()),
            template_type: Some("welcome".to_string()),
            recipient_name: Some("Paul".to_string()),
            ..input(title, "Frank Herbert")
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_identity() {
        let f = fixture();

        let first = f.service.create(input("Dune", "Frank Herbert")).await.unwrap();
        let second = f.service.create(input("Hyperion", "Dan Simmons")).await.unwrap();

        assert!(first.id > 0);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn create_publishes_one_event_per_subject() {
        let f = fixture();

        let created = f.service.create(input("Dune", "Frank Herbert")).await.unwrap();

        assert_eq!(f.nats.publish_count_for(BOOKS_SUBJECT), 1);
        assert_eq!(f.nats.publish_count_for(EVENTS_SUBJECT), 1);

        let message = &f.nats.messages_for_subject(BOOKS_SUBJECT)[0];
        let event: BookChangeEvent = f.nats.deserialize_message(message).unwrap();
        assert_eq!(event.action, ChangeAction::Create);
        assert_eq!(event.id, created.id);
        assert_eq!(event.title, "Dune");
        assert_eq!(event.stock, 4);
    }

    #[tokio::test]
    async fn create_sends_templated_notification() {
        let f = fixture();

        f.service
            .create(input_with_email("Dune", "paul@arrakis.example"))
            .await
            .unwrap();

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "paul@arrakis.example");
        assert_eq!(sent[0].subject, "Book Created: Dune");
        assert_eq!(sent[0].template.as_deref(), Some("welcome"));
        let model = sent[0].model.as_ref().unwrap();
        assert_eq!(model["name"], "Paul");
        assert_eq!(model["bookTitle"], "Dune");
    }

    #[tokio::test]
    async fn create_without_template_type_passes_no_template() {
        let f = fixture();

        f.service
            .create(NewBook {
                email: Some("paul@arrakis.example".to_string()),
                ..input("Dune", "Frank Herbert")
            })
            .await
            .unwrap();

        // The stored (absent) selector goes through as-is; nothing is
        // substituted in its place.
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].template.is_none());
        assert!(sent[0].model.is_some());
    }

    #[tokio::test]
    async fn blank_email_skips_notification() {
        let f = fixture();

        f.service
            .create(NewBook {
                email: Some("   ".to_string()),
                ..input("Dune", "Frank Herbert")
            })
            .await
            .unwrap();

        assert_eq!(f.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn bus_failure_never_changes_mutation_result() {
        let f = fixture();
        f.nats.set_failing(true);

        let created = f.service.create(input("Dune", "Frank Herbert")).await;

        assert!(created.is_ok());
        assert_eq!(f.store.books().len(), 1);
    }

    #[tokio::test]
    async fn notification_failure_never_changes_mutation_result() {
        let f = fixture();
        f.notifier.set_failing(true);

        let created = f.service
            .create(input_with_email("Dune", "paul@arrakis.example"))
            .await;

        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn get_by_id_missing_is_not_found() {
        let f = fixture();

        let result = f.service.get_by_id(99).await;

        assert!(matches!(result, Err(BookError::NotFound(99))));
    }

    #[tokio::test]
    async fn search_without_filters_returns_empty() {
        let f = fixture();
        f.service.create(input("Dune", "Frank Herbert")).await.unwrap();

        let results = f.service.search(None, None).await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_by_title_is_case_insensitive() {
        let f = fixture();
        f.service.create(input("Dune", "Frank Herbert")).await.unwrap();
        f.service.create(input("Hyperion", "Dan Simmons")).await.unwrap();

        let results = f.service.search(Some("dUn".to_string()), None).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dune");
    }

    #[tokio::test]
    async fn search_with_both_filters_intersects() {
        let f = fixture();
        f.service.create(input("Dune", "Frank Herbert")).await.unwrap();
        f.service.create(input("Dune Messiah", "Frank Herbert")).await.unwrap();
        f.service.create(input("Duma Key", "Stephen King")).await.unwrap();

        let results = f
            .service
            .search(Some("dune".to_string()), Some("herbert".to_string()))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);

        let only_author = f
            .service
            .search(None, Some("king".to_string()))
            .await
            .unwrap();
        assert_eq!(only_author.len(), 1);
        assert_eq!(only_author[0].title, "Duma Key");
    }

    #[tokio::test]
    async fn update_replaces_fields_and_keeps_notification_address() {
        let f = fixture();
        let created = f.service
            .create(input_with_email("Dune", "paul@arrakis.example"))
            .await
            .unwrap();

        let updated = f.service
            .update(created.id, input("Dune (Revised)", "Frank Herbert"))
            .await
            .unwrap();

        assert_eq!(updated.title, "Dune (Revised)");

        // Plain update notification still reaches the stored address.
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].to, "paul@arrakis.example");
        assert_eq!(sent[1].subject, "Book Updated: Dune (Revised)");
        assert!(sent[1].template.is_none());

        let message = &f.nats.messages_for_subject(BOOKS_SUBJECT)[1];
        let event: BookChangeEvent = f.nats.deserialize_message(message).unwrap();
        assert_eq!(event.action, ChangeAction::Update);
        assert_eq!(event.title, "Dune (Revised)");
    }

    #[tokio::test]
    async fn update_missing_is_not_found_without_fanout() {
        let f = fixture();

        let result = f.service.update(5, input("Dune", "Frank Herbert")).await;

        assert!(matches!(result, Err(BookError::NotFound(5))));
        assert_eq!(f.nats.publish_count(), 0);
    }

    #[tokio::test]
    async fn patch_applies_only_present_fields() {
        let f = fixture();
        let created = f.service.create(input("Dune", "Frank Herbert")).await.unwrap();

        let patched = f.service
            .patch(
                created.id,
                BookPatch {
                    price: Some(24.0),
                    ..BookPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.title, "Dune");
        assert_eq!(patched.author, "Frank Herbert");
        assert_eq!(patched.price, 24.0);
        assert_eq!(patched.stock, 4);
    }

    #[tokio::test]
    async fn patch_with_zero_stock_leaves_stock_unchanged() {
        let f = fixture();
        let created = f.service.create(input("Dune", "Frank Herbert")).await.unwrap();

        let patched = f.service
            .patch(created.id, BookPatch { stock: 0, ..BookPatch::default() })
            .await
            .unwrap();

        assert_eq!(patched.stock, 4);
    }

    #[tokio::test]
    async fn patch_with_positive_stock_sets_stock() {
        let f = fixture();
        let created = f.service.create(input("Dune", "Frank Herbert")).await.unwrap();

        let patched = f.service
            .patch(created.id, BookPatch { stock: 5, ..BookPatch::default() })
            .await
            .unwrap();

        assert_eq!(patched.stock, 5);

        let message = f.nats.messages_for_subject(BOOKS_SUBJECT).pop().unwrap();
        let event: BookChangeEvent = f.nats.deserialize_message(&message).unwrap();
        assert_eq!(event.action, ChangeAction::Patch);
        assert_eq!(event.stock, 5);
    }

    #[tokio::test]
    async fn delete_publishes_pre_deletion_state() {
        let f = fixture();
        let created = f.service
            .create(input_with_email("Dune", "paul@arrakis.example"))
            .await
            .unwrap();

        f.service.delete(created.id).await.unwrap();

        assert!(f.store.books().is_empty());

        let message = f.nats.messages_for_subject(BOOKS_SUBJECT).pop().unwrap();
        let event: BookChangeEvent = f.nats.deserialize_message(&message).unwrap();
        assert_eq!(event.action, ChangeAction::Delete);
        assert_eq!(event.id, created.id);
        assert_eq!(event.title, "Dune");

        let sent = f.notifier.sent();
        assert_eq!(sent.last().unwrap().subject, "Book Deleted: Dune");
    }

    #[tokio::test]
    async fn delete_unknown_id_produces_no_fanout() {
        let f = fixture();

        let result = f.service.delete(42).await;

        assert!(matches!(result, Err(BookError::NotFound(42))));
        assert_eq!(f.nats.publish_count(), 0);
        assert_eq!(f.nats.attempted_subjects().len(), 0);
        assert_eq!(f.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_internal() {
        let f = fixture();
        f.store.set_failing(true);

        let result = f.service.create(input("Dune", "Frank Herbert")).await;

        assert!(matches!(result, Err(BookError::Internal(_))));
        assert_eq!(f.nats.publish_count(), 0);
    }
}
