//! Application state for shared services

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::traits::Database;
use crate::domain::{DomainError, User, WebhookUrl};
use crate::infrastructure::auth::TokenService;
use crate::infrastructure::user::UserService;
use crate::infrastructure::webhook::WebhookUrlService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
    pub webhook_service: Arc<dyn WebhookUrlServiceTrait>,
    pub tokens: Arc<TokenService>,
    /// Exposes `/docs` when set
    pub debug: bool,
}

impl AppState {
    pub fn new(
        user_service: Arc<dyn UserServiceTrait>,
        webhook_service: Arc<dyn WebhookUrlServiceTrait>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            user_service,
            webhook_service,
            tokens,
            debug: false,
        }
    }

    /// State backed by the concrete services over one database
    pub fn from_database<D: Database>(database: Arc<D>, tokens: Arc<TokenService>) -> Self {
        Self::new(
            Arc::new(UserService::new(database.clone())),
            Arc::new(WebhookUrlService::new(database)),
            tokens,
        )
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Trait for user service operations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn create_user(&self, name: &str) -> Result<User, DomainError>;
    async fn get(&self, id: Uuid) -> Result<Option<User>, DomainError>;
}

/// Trait for webhook URL service operations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WebhookUrlServiceTrait: Send + Sync {
    async fn set_url(&self, url: &str) -> Result<WebhookUrl, DomainError>;
    async fn current(&self) -> Result<Option<WebhookUrl>, DomainError>;
}

#[async_trait::async_trait]
impl<D: Database> UserServiceTrait for UserService<D> {
    async fn create_user(&self, name: &str) -> Result<User, DomainError> {
        UserService::create_user(self, name).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        UserService::get(self, id).await
    }
}

#[async_trait::async_trait]
impl<D: Database> WebhookUrlServiceTrait for WebhookUrlService<D> {
    async fn set_url(&self, url: &str) -> Result<WebhookUrl, DomainError> {
        WebhookUrlService::set_url(self, url).await
    }

    async fn current(&self) -> Result<Option<WebhookUrl>, DomainError> {
        WebhookUrlService::current(self).await
    }
}
