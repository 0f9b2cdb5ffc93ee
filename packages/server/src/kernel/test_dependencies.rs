// Test doubles - mock implementations for testing
//
// Recording in-memory stand-ins for the store and notifier traits. The bus
// double (`TestNats`) lives next to the real client in kernel::nats.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use crate::domains::books::models::{Book, NewBook};
use crate::kernel::traits::{BaseBookStore, BaseNotifier};

// =============================================================================
// In-memory Book Store
// =============================================================================

/// In-memory store with sequential identity assignment.
#[derive(Default)]
pub struct TestBookStore {
    books: Mutex<Vec<Book>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl TestBookStore {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every store call fail, for exercising the internal-error path.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of all stored books.
    pub fn books(&self) -> Vec<Book> {
        self.books.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl BaseBookStore for TestBookStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        self.check_available()?;
        Ok(self.books.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        self.check_available()?;
        Ok(self.books.lock().unwrap().clone())
    }

    async fn find_by_title_contains(&self, title: &str) -> Result<Vec<Book>> {
        self.check_available()?;
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| contains_ignore_case(&b.title, title))
            .cloned()
            .collect())
    }

    async fn find_by_author_contains(&self, author: &str) -> Result<Vec<Book>> {
        self.check_available()?;
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| contains_ignore_case(&b.author, author))
            .cloned()
            .collect())
    }

    async fn find_by_title_and_author_contains(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Vec<Book>> {
        self.check_available()?;
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                contains_ignore_case(&b.title, title) && contains_ignore_case(&b.author, author)
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, book: NewBook) -> Result<Book> {
        self.check_available()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = Book {
            id,
            title: book.title,
            author: book.author,
            price: book.price,
            stock: book.stock,
            email: book.email,
            template_type: book.template_type,
            recipient_name: book.recipient_name,
        };
        self.books.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn save(&self, book: &Book) -> Result<Book> {
        self.check_available()?;
        let mut books = self.books.lock().unwrap();
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(book.clone())
            }
            None => anyhow::bail!("no book with id {}", book.id),
        }
    }

    async fn delete(&self, book: &Book) -> Result<()> {
        self.check_available()?;
        self.books.lock().unwrap().retain(|b| b.id != book.id);
        Ok(())
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

/// A notification captured by `TestNotifier`.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub template: Option<String>,
    pub model: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Default)]
pub struct TestNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl TestNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All notifications delivered so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn record(&self, notification: SentNotification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("mail gateway unavailable");
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[async_trait]
impl BaseNotifier for TestNotifier {
    async fn send_plain(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.record(SentNotification {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            template: None,
            model: None,
        })
    }

    async fn send_templated(
        &self,
        to: &str,
        subject: &str,
        template: Option<&str>,
        body: &str,
        model: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        self.record(SentNotification {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            template: template.map(str::to_string),
            model: Some(model.clone()),
        })
    }
}
