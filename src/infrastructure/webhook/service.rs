//! Webhook URL registration

use std::sync::Arc;

use tracing::info;

use crate::domain::query::{LoadHint, ReadQuery};
use crate::domain::traits::{Database, Repository};
use crate::domain::webhook::WebhookUrl;
use crate::domain::DomainError;

/// Keeps the single webhook URL row
#[derive(Debug)]
pub struct WebhookUrlService<D: Database> {
    database: Arc<D>,
}

impl<D: Database> Clone for WebhookUrlService<D> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
        }
    }
}

impl<D: Database> WebhookUrlService<D> {
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }

    /// Update the existing row in place, or create it
    pub async fn set_url(&self, url: &str) -> Result<WebhookUrl, DomainError> {
        let mut repo = self.database.begin().await?;

        let existing = repo
            .read::<WebhookUrl>(ReadQuery::first().with_hints([LoadHint::ForUpdate]))
            .await?
            .into_one()?;

        let webhook = match existing {
            Some(mut webhook) => {
                webhook.url = url.to_string();
                webhook
            }
            None => WebhookUrl::create(url),
        };

        let webhook = repo.save_one(webhook).await?;
        repo.commit().await?;

        info!(webhook_id = %webhook.id, url = %webhook.url, "Webhook URL set");
        Ok(webhook)
    }

    /// The configured webhook URL, if any
    pub async fn current(&self) -> Result<Option<WebhookUrl>, DomainError> {
        let mut repo = self.database.begin().await?;
        repo.first::<WebhookUrl>().await
    }
}
