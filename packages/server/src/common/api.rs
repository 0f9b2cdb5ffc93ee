//! Uniform API response envelope.
//!
//! Every endpoint, success or failure, answers with
//! `{status, message, data, timestamp}`; the HTTP status mirrors the
//! envelope's `status` field.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data,
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn success(data: T) -> Self {
        Self::new(StatusCode::OK, "Request processed successfully", Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }
}

impl ApiResponse<serde_json::Value> {
    /// Error envelope with no payload.
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, message, None)
    }

    /// 400 envelope carrying a field -> message map.
    pub fn validation(errors: BTreeMap<String, String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            Some(json!(errors)),
        )
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let code =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(self)).into_response()
    }
}
