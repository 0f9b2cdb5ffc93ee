use serde::{Deserialize, Serialize};

use crate::domains::books::models::Book;

/// Book response projection returned by the API.
///
/// Notification fields (email, template, recipient) never leave the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookData {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub stock: i32,
}

impl From<Book> for BookData {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            price: book.price,
            stock: book.stock,
        }
    }
}
