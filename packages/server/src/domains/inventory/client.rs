//! Resilient client for the external inventory service.
//!
//! Wraps the product-listing call in bounded protection: circuit breaker,
//! bounded retry with backoff, a hard per-attempt timeout, and a static
//! fallback payload. The call never errors; "service unavailable" is a
//! successful result carrying the fallback string, so upstream layers need no
//! special-case handling for this dependency.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::InventorySettings;
use crate::domains::inventory::breaker::CircuitBreaker;

/// Sentinel returned whenever the inventory service cannot be reached.
pub const FALLBACK_PAYLOAD: &str =
    "Inventory service is temporarily unavailable. Please try later.";

/// Failure classes for a single gateway attempt.
///
/// Transient failures (connect, timeout) are retried and the attempt repeated;
/// a well-formed HTTP error response is terminal for the call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("inventory service returned status {0}")]
    Status(u16),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Connect(_) | GatewayError::Timeout)
    }
}

/// The raw HTTP call to the inventory service.
#[async_trait]
pub trait ProductsGateway: Send + Sync {
    async fn fetch_products(&self) -> Result<String, GatewayError>;
}

/// reqwest-backed gateway.
pub struct HttpProductsGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpProductsGateway {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

fn map_reqwest_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Connect(error.to_string())
    }
}

#[async_trait]
impl ProductsGateway for HttpProductsGateway {
    async fn fetch_products(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }

        response.text().await.map_err(map_reqwest_error)
    }
}

/// Resilient read path into the inventory service.
pub struct InventoryClient {
    gateway: Arc<dyn ProductsGateway>,
    breaker: CircuitBreaker,
    retry_attempts: u32,
    retry_backoff: Duration,
    attempt_timeout: Duration,
}

impl InventoryClient {
    pub fn new(gateway: Arc<dyn ProductsGateway>, settings: &InventorySettings) -> Self {
        Self {
            gateway,
            breaker: CircuitBreaker::new(settings.failure_threshold, settings.cooldown),
            retry_attempts: settings.retry_attempts.max(1),
            retry_backoff: settings.retry_backoff,
            attempt_timeout: settings.attempt_timeout,
        }
    }

    /// Fetch the product listing, or the fallback payload.
    ///
    /// Every attempt passes through the breaker and is individually recorded;
    /// a timeout abandons only the in-flight attempt, the failure still
    /// counts toward the breaker.
    pub async fn fetch_products(&self) -> String {
        info!("Calling inventory service");

        for attempt in 1..=self.retry_attempts {
            if !self.breaker.try_acquire().await {
                debug!("Inventory circuit open, short-circuiting to fallback");
                return FALLBACK_PAYLOAD.to_string();
            }

            match self.attempt().await {
                Ok(body) => {
                    self.breaker.record_success().await;
                    return body;
                }
                Err(error) => {
                    self.breaker.record_failure().await;
                    if !error.is_transient() {
                        warn!(error = %error, "Inventory call failed, falling back");
                        return FALLBACK_PAYLOAD.to_string();
                    }
                    warn!(error = %error, attempt, "Inventory attempt failed");
                    if attempt < self.retry_attempts {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
            }
        }

        warn!("Inventory attempts exhausted, falling back");
        FALLBACK_PAYLOAD.to_string()
    }

    async fn attempt(&self) -> Result<String, GatewayError> {
        match tokio::time::timeout(self.attempt_timeout, self.gateway.fetch_products()).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout),
        }
    }
}
