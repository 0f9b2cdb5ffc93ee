pub mod data;
pub mod errors;
pub mod events;
pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use data::BookData;
pub use errors::BookError;
pub use events::{BookChangeEvent, ChangeAction, ChangePublisher, BOOKS_SUBJECT, EVENTS_SUBJECT};
pub use models::{Book, BookPatch, NewBook};
pub use service::BookService;
pub use store::PostgresBookStore;
