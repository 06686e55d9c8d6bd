//! Process-wide application context
//!
//! Owns the configuration, the database handle, the token service and the
//! scheduler. Built once at startup and handed to whatever needs it.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::domain::traits::Database;
use crate::domain::DomainError;
use crate::infrastructure::auth::{TokenConfig, TokenService};
use crate::infrastructure::scheduler::{DailySchedule, Scheduler};
use crate::infrastructure::storage::{PgDatabase, PostgresConfig};
use crate::infrastructure::webhook::{CheckSubscriptionsJob, WebhookDispatcher, WebhookUrlService};

pub struct AppContext<D: Database = PgDatabase> {
    config: AppConfig,
    database: Arc<D>,
    tokens: Arc<TokenService>,
    scheduler: Scheduler,
}

impl AppContext<PgDatabase> {
    /// Connect to the configured PostgreSQL database and build the context
    pub async fn connect(config: AppConfig) -> Result<Self, DomainError> {
        let url = config.database_url()?;
        let database = PgDatabase::connect(
            &PostgresConfig::new(url).with_max_connections(config.database_max_connections),
        )
        .await?;

        Self::new(config, Arc::new(database))
    }
}

impl<D: Database> AppContext<D> {
    pub fn new(config: AppConfig, database: Arc<D>) -> Result<Self, DomainError> {
        let tokens = TokenService::new(&TokenConfig::new(
            &config.jwt_secret_key,
            &config.jwt_algorithm,
        ))?;

        let mut scheduler = Scheduler::new();
        if config.scheduler.enabled {
            let dispatcher = WebhookDispatcher::new(
                WebhookUrlService::new(database.clone()),
                Duration::from_secs(config.webhook.timeout_secs),
            )?;
            scheduler.add_daily(
                Arc::new(CheckSubscriptionsJob::new(dispatcher)),
                DailySchedule::new(config.scheduler.hour, config.scheduler.minute)?,
            );
        }

        Ok(Self {
            config,
            database,
            tokens: Arc::new(tokens),
            scheduler,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &Arc<D> {
        &self.database
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// HTTP state sharing this context's database and token service
    pub fn state(&self, debug: bool) -> AppState {
        AppState::from_database(self.database.clone(), self.tokens.clone()).with_debug(debug)
    }

    /// Start background jobs. Idempotent.
    pub fn start(&mut self) {
        self.scheduler.start();
        info!(app = %self.config.app_name, version = %self.config.app_version, "Application started");
    }

    /// Stop background jobs and release the database pool
    pub async fn shutdown(&mut self) {
        self.scheduler.shutdown().await;
        self.database.close().await;
        info!("Application shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryDatabase;

    fn context(config: AppConfig) -> Result<AppContext<InMemoryDatabase>, DomainError> {
        AppContext::new(config, Arc::new(InMemoryDatabase::new()))
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut ctx = context(AppConfig::default()).unwrap();
        assert_eq!(ctx.scheduler().jobs().len(), 1);
        assert_eq!(ctx.scheduler().jobs()[0].id(), "check_subscriptions");

        ctx.start();
        assert!(ctx.scheduler().is_started());

        ctx.shutdown().await;
        assert!(!ctx.scheduler().is_started());
    }

    #[test]
    fn test_scheduler_disabled() {
        let mut config = AppConfig::default();
        config.scheduler.enabled = false;

        let ctx = context(config).unwrap();
        assert!(ctx.scheduler().jobs().is_empty());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let mut config = AppConfig::default();
        config.scheduler.hour = 24;

        assert!(matches!(
            context(config),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let mut config = AppConfig::default();
        config.jwt_algorithm = "RS256".to_string();

        assert!(matches!(
            context(config),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_state_shares_token_service() {
        let ctx = context(AppConfig::default()).unwrap();
        let state = ctx.state(true);

        assert!(state.debug);
        assert!(Arc::ptr_eq(&state.tokens, ctx.tokens()));
    }
}
