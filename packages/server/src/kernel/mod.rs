//! Kernel module - server infrastructure and dependencies.

pub mod best_effort;
pub mod mailer;
pub mod nats;
pub mod test_dependencies;
pub mod traits;

pub use best_effort::best_effort;
pub use mailer::MailGatewayClient;
pub use nats::{
    connect_bus, spawn_log_consumer, NatsClientPublisher, NatsPublisher, PublishedMessage, TestNats,
};
pub use test_dependencies::{SentNotification, TestBookStore, TestNotifier};
pub use traits::*;
