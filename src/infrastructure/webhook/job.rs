use async_trait::async_trait;

use super::dispatcher::WebhookDispatcher;
use crate::domain::traits::Database;
use crate::domain::webhook::WebhookPayload;
use crate::domain::DomainError;
use crate::infrastructure::scheduler::Job;

/// Daily notification to the webhook URL
pub struct CheckSubscriptionsJob<D: Database> {
    dispatcher: WebhookDispatcher<D>,
}

impl<D: Database> CheckSubscriptionsJob<D> {
    pub const ID: &'static str = WebhookPayload::CHECK_SUBSCRIPTIONS;

    pub fn new(dispatcher: WebhookDispatcher<D>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl<D: Database> Job for CheckSubscriptionsJob<D> {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self) -> Result<(), DomainError> {
        self.dispatcher.dispatch(WebhookPayload::check_subscriptions());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryDatabase;
    use crate::infrastructure::webhook::WebhookUrlService;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_without_waiting_for_delivery() {
        let webhooks = WebhookUrlService::new(Arc::new(InMemoryDatabase::new()));
        let dispatcher = WebhookDispatcher::new(webhooks, Duration::from_secs(1)).unwrap();
        let job = CheckSubscriptionsJob::new(dispatcher);

        assert_eq!(job.id(), "check_subscriptions");
        assert!(job.run().await.is_ok());
    }
}
