pub mod book;

pub use book::{Book, BookPatch, NewBook};
