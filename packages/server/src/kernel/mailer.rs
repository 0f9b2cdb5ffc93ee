//! Mail gateway client.
//!
//! Sends notifications through an HTTP mail gateway. Template rendering and
//! actual delivery happen gateway-side; this client only posts the message
//! envelope and reports transport/status failures to the caller.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::kernel::traits::BaseNotifier;

pub struct MailGatewayClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct MailMessage<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a serde_json::Map<String, serde_json::Value>>,
}

impl MailGatewayClient {
    pub fn new(base_url: String, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_token,
        }
    }

    async fn post_message(&self, message: &MailMessage<'_>) -> Result<()> {
        let mut request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(message);

        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        info!("Sending notification to: {}", message.to);

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            error!("Mail gateway rejected message {}: {}", status, body);
            anyhow::bail!("Mail gateway error {}: {}", status, body);
        }

        Ok(())
    }
}

#[async_trait]
impl BaseNotifier for MailGatewayClient {
    async fn send_plain(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.post_message(&MailMessage {
            to,
            subject,
            body,
            template: None,
            model: None,
        })
        .await
    }

    async fn send_templated(
        &self,
        to: &str,
        subject: &str,
        template: Option<&str>,
        body: &str,
        model: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        self.post_message(&MailMessage {
            to,
            subject,
            body,
            template,
            model: Some(model),
        })
        .await
    }
}
