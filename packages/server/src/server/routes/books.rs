//! Book endpoints.
//!
//! Input validation happens here, upstream of the service layer; the service
//! assumes well-formed input. All responses use the common envelope.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::common::ApiResponse;
use crate::domains::books::{BookData, BookError, BookPatch, NewBook};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub title: Option<String>,
    pub author: Option<String>,
}

fn book_error_response(error: BookError) -> Response {
    match error {
        BookError::NotFound(_) => {
            warn!("Resource not found: {}", error);
            ApiResponse::failure(StatusCode::NOT_FOUND, error.to_string()).into_response()
        }
        BookError::Internal(error) => {
            error!(error = %error, "Unhandled error");
            ApiResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
                .into_response()
        }
    }
}

/// Field-level validation for create and full-update bodies.
fn validate_new_book(input: &NewBook) -> Result<(), BTreeMap<String, String>> {
    let mut errors = BTreeMap::new();

    let title_len = input.title.trim().chars().count();
    if title_len == 0 {
        errors.insert("title".to_string(), "Title is required".to_string());
    } else if !(2..=100).contains(&title_len) {
        errors.insert(
            "title".to_string(),
            "Title must be between 2 and 100 characters".to_string(),
        );
    }

    if input.author.trim().is_empty() {
        errors.insert("author".to_string(), "Author is required".to_string());
    }

    if !(input.price > 0.0) {
        errors.insert(
            "price".to_string(),
            "Price must be greater than 0".to_string(),
        );
    }

    if input.stock < 1 {
        errors.insert("stock".to_string(), "Minimum stock should be 1".to_string());
    }

    if let Some(email) = input.email.as_deref() {
        let email = email.trim();
        if !email.is_empty() && !email.contains('@') {
            errors.insert("email".to_string(), "Invalid email format".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(input): Json<NewBook>,
) -> Response {
    if let Err(errors) = validate_new_book(&input) {
        debug!("Validation failed: {:?}", errors);
        return ApiResponse::validation(errors).into_response();
    }

    info!("Creating book: {}", input.title);
    match state.books.create(input).await {
        Ok(book) => {
            ApiResponse::created("Book created successfully", book).into_response()
        }
        Err(error) => book_error_response(error),
    }
}

pub async fn get_all_books(State(state): State<AppState>) -> Response {
    debug!("Getting all books");
    match state.books.get_all().await {
        Ok(books) => ApiResponse::success(books).into_response(),
        Err(error) => book_error_response(error),
    }
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    debug!("Getting book by ID: {}", id);
    match state.books.get_by_id(id).await {
        Ok(book) => ApiResponse::success(book).into_response(),
        Err(error) => book_error_response(error),
    }
}

pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    debug!(title = ?params.title, author = ?params.author, "Searching books");
    match state.books.search(params.title, params.author).await {
        Ok(books) => ApiResponse::success(books).into_response(),
        Err(error) => book_error_response(error),
    }
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<NewBook>,
) -> Response {
    if let Err(errors) = validate_new_book(&input) {
        debug!("Validation failed: {:?}", errors);
        return ApiResponse::validation(errors).into_response();
    }

    info!("Updating book ID: {}", id);
    match state.books.update(id, input).await {
        Ok(book) => ApiResponse::new(
            StatusCode::OK,
            "Resource updated successfully",
            Some(book),
        )
        .into_response(),
        Err(error) => book_error_response(error),
    }
}

pub async fn patch_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<BookPatch>,
) -> Response {
    info!("Patching book ID: {}", id);
    match state.books.patch(id, patch).await {
        Ok(book) => ApiResponse::new(
            StatusCode::OK,
            "Resource updated successfully",
            Some(book),
        )
        .into_response(),
        Err(error) => book_error_response(error),
    }
}

pub async fn delete_book(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    warn!("Deleting book ID: {}", id);
    match state.books.delete(id).await {
        Ok(()) => ApiResponse::new(
            StatusCode::OK,
            "Resource deleted successfully",
            Some("Book deleted successfully".to_string()),
        )
        .into_response(),
        Err(error) => book_error_response(error),
    }
}

/// Inventory read path. Always answers 200; outages surface as the fallback
/// payload in `data`, never as an error status.
pub async fn inventory_products(State(state): State<AppState>) -> Response {
    info!("Requesting inventory products");
    let data = state.inventory.fetch_products().await;
    ApiResponse::success(data).into_response()
}
