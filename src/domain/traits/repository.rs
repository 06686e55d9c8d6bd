use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use crate::domain::entity::Entity;
use crate::domain::query::{ReadQuery, ReadRequest, ReadResult};
use crate::domain::DomainError;

/// A database that hands out units of work
#[async_trait]
pub trait Database: Send + Sync + Debug + 'static {
    type Repo: Repository;

    /// Open a unit of work; dropping it without `commit` discards its writes
    async fn begin(&self) -> Result<Self::Repo, DomainError>;

    /// Release pooled connections
    async fn close(&self) {}
}

/// Generic repository bound to one unit of work
///
/// Writes are staged and become visible to other units of work only after
/// `commit`.
#[async_trait]
pub trait Repository: Send + Sized {
    async fn read<'a, E: Entity>(
        &'a mut self,
        query: ReadQuery,
    ) -> Result<ReadResult<'a, E>, DomainError>;

    /// Upsert by primary key
    async fn save<E: Entity>(&mut self, entities: Vec<E>) -> Result<Vec<E>, DomainError>;

    /// Remove by primary key, returning the number of rows removed
    async fn delete<E: Entity>(&mut self, entities: Vec<E>) -> Result<u64, DomainError>;

    async fn commit(self) -> Result<(), DomainError>;

    async fn fetch<'a, E: Entity>(
        &'a mut self,
        request: ReadRequest,
    ) -> Result<ReadResult<'a, E>, DomainError> {
        let query = request.build()?;
        self.read(query).await
    }

    async fn get<E: Entity>(&mut self, id: Uuid) -> Result<Option<E>, DomainError> {
        self.read::<E>(ReadQuery::by_key(id)).await?.into_one()
    }

    async fn first<E: Entity>(&mut self) -> Result<Option<E>, DomainError> {
        self.read::<E>(ReadQuery::first()).await?.into_one()
    }

    async fn save_one<E: Entity>(&mut self, entity: E) -> Result<E, DomainError> {
        self.save(vec![entity])
            .await?
            .pop()
            .ok_or_else(|| DomainError::internal("save returned no entity"))
    }

    async fn delete_one<E: Entity>(&mut self, entity: E) -> Result<bool, DomainError> {
        Ok(self.delete(vec![entity]).await? > 0)
    }
}
