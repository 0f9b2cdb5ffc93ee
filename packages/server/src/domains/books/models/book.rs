use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A book record as stored in the catalog.
///
/// This is the single canonical record type; external-facing projections
/// (`BookData`) are derived from it with pure mapping functions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    /// Unique identifier, assigned by the store on creation
    pub id: i64,

    /// Title, 2-100 characters
    pub title: String,

    pub author: String,

    /// Unit price, strictly positive
    pub price: f64,

    /// Copies in stock, at least 1 on creation
    pub stock: i32,

    /// Notification address; fan-out notifications are skipped when absent or blank
    pub email: Option<String>,

    /// Template selector for the creation notification
    pub template_type: Option<String>,

    /// Display name of the notification recipient
    pub recipient_name: Option<String>,
}

/// Input for creating a book or fully replacing one (POST / PUT bodies).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub stock: i32,
    pub email: Option<String>,
    pub template_type: Option<String>,
    pub recipient_name: Option<String>,
}

/// Partial update (PATCH body). Absent fields leave the record unchanged.
///
/// `stock` keeps the original wire contract: it always deserializes, and a
/// non-positive value means "leave stock as-is", not "set stock to zero".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: i32,
}
