//! Postgres-backed book store.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::domains::books::models::{Book, NewBook};
use crate::kernel::traits::BaseBookStore;

const BOOK_COLUMNS: &str = "id, title, author, price, stock, email, template_type, recipient_name";

pub struct PostgresBookStore {
    pool: PgPool,
}

impl PostgresBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseBookStore for PostgresBookStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books ORDER BY id",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn find_by_title_contains(&self, title: &str) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE title ILIKE '%' || $1 || '%' ORDER BY id",
            BOOK_COLUMNS
        ))
        .bind(title)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn find_by_author_contains(&self, author: &str) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE author ILIKE '%' || $1 || '%' ORDER BY id",
            BOOK_COLUMNS
        ))
        .bind(author)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn find_by_title_and_author_contains(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books \
             WHERE title ILIKE '%' || $1 || '%' AND author ILIKE '%' || $2 || '%' \
             ORDER BY id",
            BOOK_COLUMNS
        ))
        .bind(title)
        .bind(author)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn insert(&self, book: NewBook) -> Result<Book> {
        let stored = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (title, author, price, stock, email, template_type, recipient_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price)
        .bind(book.stock)
        .bind(&book.email)
        .bind(&book.template_type)
        .bind(&book.recipient_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn save(&self, book: &Book) -> Result<Book> {
        let stored = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books \
             SET title = $2, author = $3, price = $4, stock = $5, \
                 email = $6, template_type = $7, recipient_name = $8 \
             WHERE id = $1 \
             RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.price)
        .bind(book.stock)
        .bind(&book.email)
        .bind(&book.template_type)
        .bind(&book.recipient_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn delete(&self, book: &Book) -> Result<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
