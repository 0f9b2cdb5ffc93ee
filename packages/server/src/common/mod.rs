// Common types and utilities shared across the application

pub mod api;

pub use api::ApiResponse;
