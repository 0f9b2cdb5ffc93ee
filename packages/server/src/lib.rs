// Library Catalog Service - API Core
//
// Backend for the book catalog. Every committed mutation fans out change
// events to the message bus (two encodings) and a best-effort notification;
// an independent read path reaches the inventory service behind circuit
// breaker, retry, timeout, and fallback.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
