//! Fire-and-forget delivery to the configured webhook URL

use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::service::WebhookUrlService;
use crate::domain::traits::Database;
use crate::domain::webhook::WebhookPayload;
use crate::domain::DomainError;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Delivered { url: String, status: u16 },
    NotConfigured,
}

/// Posts payloads to the webhook URL; no retries
pub struct WebhookDispatcher<D: Database> {
    webhooks: WebhookUrlService<D>,
    http_client: Client,
}

impl<D: Database> Clone for WebhookDispatcher<D> {
    fn clone(&self) -> Self {
        Self {
            webhooks: self.webhooks.clone(),
            http_client: self.http_client.clone(),
        }
    }
}

impl<D: Database> std::fmt::Debug for WebhookDispatcher<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("webhooks", &self.webhooks)
            .finish()
    }
}

impl<D: Database> WebhookDispatcher<D> {
    pub fn new(webhooks: WebhookUrlService<D>, timeout: Duration) -> Result<Self, DomainError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            webhooks,
            http_client,
        })
    }

    /// Post the payload to the current webhook URL; a non-2xx status fails
    pub async fn send(&self, payload: &WebhookPayload) -> Result<DispatchOutcome, DomainError> {
        let Some(webhook) = self.webhooks.current().await? else {
            return Ok(DispatchOutcome::NotConfigured);
        };

        let response = self
            .http_client
            .post(&webhook.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "Request timed out".to_string()
                } else if e.is_connect() {
                    "Connection failed".to_string()
                } else {
                    format!("Request failed: {}", e)
                };
                DomainError::bad_request(reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::bad_request(format!(
                "Request failed with HTTP status {}",
                status.as_u16()
            )));
        }

        Ok(DispatchOutcome::Delivered {
            url: webhook.url,
            status: status.as_u16(),
        })
    }

    /// Send on a detached task; the returned watcher logs how it ended
    pub fn dispatch(&self, payload: WebhookPayload) -> JoinHandle<()> {
        let dispatcher = self.clone();
        let event = payload.event.clone();
        let delivery = tokio::spawn(async move { dispatcher.send(&payload).await });

        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(DispatchOutcome::Delivered { url, status })) => {
                    info!(event = %event, url = %url, status = status, "Webhook sent successfully");
                }
                Ok(Ok(DispatchOutcome::NotConfigured)) => {
                    warn!(event = %event, "Webhook failed: no webhook URL configured");
                }
                Ok(Err(e)) => {
                    warn!(event = %event, error = %e, "Webhook failed");
                }
                Err(e) if e.is_panic() => {
                    error!(event = %event, "Webhook failed: delivery task panicked");
                }
                Err(e) => {
                    warn!(event = %event, error = %e, "Webhook failed: delivery task cancelled");
                }
            }
        })
    }
}
