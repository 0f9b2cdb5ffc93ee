pub mod breaker;
pub mod client;

pub use breaker::{CircuitBreaker, CircuitState};
pub use client::{
    GatewayError, HttpProductsGateway, InventoryClient, ProductsGateway, FALLBACK_PAYLOAD,
};
