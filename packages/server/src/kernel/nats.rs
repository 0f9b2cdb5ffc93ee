//! NATS client abstraction for production and testing.
//!
//! Provides a trait-based publisher that allows swapping between real NATS
//! connections and a recording test double, plus the log-only consumer that
//! mirrors what downstream services see on the book subjects.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// A published message.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub subject: String,
    pub payload: Bytes,
}

/// Trait for bus publish operations.
///
/// This allows swapping between real NATS and test mocks. Implementations
/// are safe for concurrent use; callers need no external locking.
#[async_trait]
pub trait NatsPublisher: Send + Sync {
    /// Publish a message to a subject.
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;
}

/// Connect to the bus without requiring it to be up.
///
/// Uses retry-on-initial-connect: a down bus yields a working client whose
/// publishes fail (and are absorbed downstream) until the connection is
/// established in the background. Startup must never depend on the bus.
pub async fn connect_bus(url: &str) -> Result<async_nats::Client> {
    let client = async_nats::ConnectOptions::new()
        .retry_on_initial_connect()
        .connect(url)
        .await?;
    Ok(client)
}

/// Real NATS client publisher.
pub struct NatsClientPublisher {
    client: async_nats::Client,
}

impl NatsClientPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NatsPublisher for NatsClientPublisher {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.client.publish(subject, payload).await?;
        Ok(())
    }
}

/// Spawn a background consumer that logs every message on `subject`.
///
/// Subscribes with a queue group so multiple service instances share the
/// stream. Failure to subscribe is logged and otherwise ignored - the bus
/// being down must not stop the server from starting.
pub fn spawn_log_consumer(client: async_nats::Client, subject: String, group: String) {
    tokio::spawn(async move {
        match client.queue_subscribe(subject.clone(), group).await {
            Ok(mut subscriber) => {
                while let Some(message) = subscriber.next().await {
                    let text = String::from_utf8_lossy(&message.payload);
                    tracing::info!(subject = %message.subject, "Consumed message: {}", text);
                }
            }
            Err(error) => {
                tracing::error!(error = %error, subject = %subject, "Failed to subscribe");
            }
        }
    });
}

/// Mock bus client that tracks published messages for testing.
///
/// Records every publish attempt; individual subjects (or the whole bus) can
/// be made to fail so tests can exercise the absorb-and-continue contract.
#[derive(Default)]
pub struct TestNats {
    /// Every subject a publish was attempted on, in order.
    attempts: RwLock<Vec<String>>,
    /// Messages that were accepted (publish returned Ok).
    published: RwLock<Vec<PublishedMessage>>,
    /// Subjects whose publishes fail.
    failing_subjects: RwLock<Vec<String>>,
    /// When set, every publish fails.
    fail_all: AtomicBool,
}

impl TestNats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish fail.
    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    /// Make publishes to one subject fail while others succeed.
    pub fn fail_subject(&self, subject: &str) {
        self.failing_subjects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(subject.to_string());
    }

    /// Subjects publish was attempted on, including failed attempts.
    pub fn attempted_subjects(&self) -> Vec<String> {
        self.attempts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get all accepted messages.
    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get accepted messages for a specific subject.
    pub fn messages_for_subject(&self, subject: &str) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.subject == subject)
            .cloned()
            .collect()
    }

    /// Count of accepted messages on a subject.
    pub fn publish_count_for(&self, subject: &str) -> usize {
        self.messages_for_subject(subject).len()
    }

    /// Total count of accepted messages.
    pub fn publish_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Deserialize an accepted message payload as JSON.
    pub fn deserialize_message<T: serde::de::DeserializeOwned>(
        &self,
        message: &PublishedMessage,
    ) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&message.payload)
    }
}

#[async_trait]
impl NatsPublisher for TestNats {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
        self.attempts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(subject.clone());

        let subject_fails = self
            .failing_subjects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&subject);
        if self.fail_all.load(Ordering::SeqCst) || subject_fails {
            anyhow::bail!("bus unavailable for subject {}", subject);
        }

        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishedMessage { subject, payload });
        Ok(())
    }
}
