//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header::CONTENT_TYPE, Method};
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::books::{
    BookService, ChangePublisher, PostgresBookStore, BOOKS_SUBJECT, EVENTS_SUBJECT,
};
use crate::domains::inventory::{HttpProductsGateway, InventoryClient};
use crate::kernel::{
    connect_bus, spawn_log_consumer, BaseBookStore, BaseNotifier, MailGatewayClient,
    NatsClientPublisher, NatsPublisher,
};
use crate::server::routes::{
    create_book, delete_book, get_all_books, get_book, health_handler, inventory_products,
    patch_book, search_books, update_book,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub books: Arc<BookService>,
    pub inventory: Arc<InventoryClient>,
}

/// Build the Axum application router.
///
/// Wires the collaborators by hand: Postgres store, NATS bus publisher (plus
/// the log-only consumers), mail gateway notifier, and the resilient
/// inventory client.
///
/// Routes:
/// - `POST   /api/books`                    - create a book
/// - `GET    /api/books`                    - list all books
/// - `GET    /api/books/search`             - filter by title and/or author
/// - `GET    /api/books/inventory-products` - inventory read-through
/// - `GET    /api/books/:id`                - fetch one book
/// - `PUT    /api/books/:id`                - full replace
/// - `PATCH  /api/books/:id`                - partial update
/// - `DELETE /api/books/:id`                - delete
/// - `GET    /health`                       - liveness/readiness probe
pub async fn build_app(pool: PgPool, config: &Config) -> Result<Router> {
    // The bus is best-effort everywhere, including here: a down bus must not
    // stop the server, so the client connects lazily and retries on its own.
    let nats_client = connect_bus(&config.nats_url)
        .await
        .context("Failed to create NATS client")?;
    spawn_log_consumer(
        nats_client.clone(),
        BOOKS_SUBJECT.to_string(),
        config.nats_consumer_group.clone(),
    );
    spawn_log_consumer(
        nats_client.clone(),
        EVENTS_SUBJECT.to_string(),
        config.nats_consumer_group.clone(),
    );
    let bus: Arc<dyn NatsPublisher> = Arc::new(NatsClientPublisher::new(nats_client));

    let store: Arc<dyn BaseBookStore> = Arc::new(PostgresBookStore::new(pool.clone()));
    let notifier: Arc<dyn BaseNotifier> = Arc::new(MailGatewayClient::new(
        config.mail_gateway_url.clone(),
        config.mail_gateway_token.clone(),
    ));
    let books = Arc::new(BookService::new(
        store,
        ChangePublisher::new(bus),
        notifier,
    ));

    let gateway = Arc::new(HttpProductsGateway::new(config.inventory.url.clone()));
    let inventory = Arc::new(InventoryClient::new(gateway, &config.inventory));

    let state = AppState {
        db_pool: pool,
        books,
        inventory,
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/api/books", axum::routing::post(create_book).get(get_all_books))
        .route("/api/books/search", get(search_books))
        .route("/api/books/inventory-products", get(inventory_products))
        .route(
            "/api/books/:id",
            get(get_book)
                .put(update_book)
                .patch(patch_book)
                .delete(delete_book),
        )
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
