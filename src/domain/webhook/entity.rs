//! Webhook URL entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::{Entity, FieldValue};

/// The URL notified by the daily webhook job
///
/// Only one row is kept; the first row is "the" webhook URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WebhookUrl {
    pub id: Uuid,
    pub url: String,
}

impl WebhookUrl {
    pub fn create(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
        }
    }
}

impl Entity for WebhookUrl {
    const TABLE: &'static str = "webhook_url";
    const COLUMNS: &'static [&'static str] = &["id", "url"];
    const MAX_ROWS: Option<usize> = Some(1);

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => Some(self.id.into()),
            "url" => Some(self.url.clone().into()),
            _ => None,
        }
    }
}

/// JSON body posted to the webhook URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl WebhookPayload {
    pub const CHECK_SUBSCRIPTIONS: &'static str = "check_subscriptions";

    pub fn check_subscriptions() -> Self {
        Self {
            event: Self::CHECK_SUBSCRIPTIONS.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}
