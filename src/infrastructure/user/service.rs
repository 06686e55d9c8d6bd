//! User service

use std::sync::Arc;

use tracing::info;

use crate::domain::traits::{Database, Repository};
use crate::domain::user::User;
use crate::domain::DomainError;

/// Creates users, one unit of work per call
#[derive(Debug)]
pub struct UserService<D: Database> {
    database: Arc<D>,
}

impl<D: Database> UserService<D> {
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }

    /// Create and persist a user with a fresh id
    pub async fn create_user(&self, name: &str) -> Result<User, DomainError> {
        let mut repo = self.database.begin().await?;
        let user = repo.save_one(User::create(name)).await?;
        repo.commit().await?;

        info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    pub async fn get(&self, id: uuid::Uuid) -> Result<Option<User>, DomainError> {
        let mut repo = self.database.begin().await?;
        repo.get::<User>(id).await
    }
}
