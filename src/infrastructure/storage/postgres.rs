//! PostgreSQL database with one transaction per unit of work

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use super::sql::{self, SqlStatement};
use crate::domain::entity::{Entity, FieldValue};
use crate::domain::query::{Page, ReadQuery, ReadResult, ResultShape};
use crate::domain::traits::{Database, Repository};
use crate::domain::DomainError;

/// PostgreSQL pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Binds owned `FieldValue`s to any sqlx query builder
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                FieldValue::Uuid(v) => query.bind(v),
                FieldValue::Boolean(v) => query.bind(v),
                FieldValue::Integer(v) => query.bind(v),
                FieldValue::Timestamp(v) => query.bind(v),
                FieldValue::Text(v) => query.bind(v),
            };
        }
        query
    }};
}

/// Keep unique violations as `AlreadyExists`, prefix everything else
fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    match DomainError::from(err) {
        DomainError::Storage { message } => {
            DomainError::storage(format!("{}: {}", context, message))
        }
        other => other,
    }
}

/// Pool-backed database
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl Debug for PgDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDatabase")
            .field("size", &self.pool.size())
            .finish()
    }
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Repo = PgRepository;

    async fn begin(&self) -> Result<PgRepository, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        Ok(PgRepository {
            tx,
            stream_sql: String::new(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Repository over an open transaction
///
/// The transaction rolls back when the repository is dropped uncommitted.
pub struct PgRepository {
    tx: Transaction<'static, Postgres>,
    // SQL text of the active stream, which borrows it
    stream_sql: String,
}

impl Debug for PgRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgRepository").finish_non_exhaustive()
    }
}

impl PgRepository {
    async fn fetch_optional<E: Entity>(
        &mut self,
        statement: SqlStatement,
    ) -> Result<Option<E>, DomainError> {
        bind_values!(sqlx::query_as::<_, E>(&statement.sql), statement.args)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to read entity", e))
    }

    async fn fetch_all<E: Entity>(&mut self, statement: SqlStatement) -> Result<Vec<E>, DomainError> {
        bind_values!(sqlx::query_as::<_, E>(&statement.sql), statement.args)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to read entities", e))
    }

    async fn count(&mut self, statement: SqlStatement) -> Result<u64, DomainError> {
        let total: i64 = bind_values!(sqlx::query_scalar::<_, i64>(&statement.sql), statement.args)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to count entities", e))?;

        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn read<'a, E: Entity>(
        &'a mut self,
        query: ReadQuery,
    ) -> Result<ReadResult<'a, E>, DomainError> {
        let statement = sql::select::<E>(&query)?;
        tracing::debug!(table = E::TABLE, sql = %statement.sql, "Executing read");

        match query.shape {
            ResultShape::First => Ok(ReadResult::One(self.fetch_optional(statement).await?)),
            ResultShape::All { .. } => Ok(ReadResult::Many(self.fetch_all(statement).await?)),
            ResultShape::Paged(params) => {
                let total = self.count(sql::count::<E>(&query.selector)?).await?;
                let items = self.fetch_all(statement).await?;
                Ok(ReadResult::Page(Page::new(items, total, params)))
            }
            ResultShape::Streamed => {
                let SqlStatement { sql, args } = statement;
                let PgRepository { tx, stream_sql } = self;
                *stream_sql = sql;

                let stream = bind_values!(sqlx::query_as::<_, E>(stream_sql.as_str()), args)
                    .fetch(&mut **tx)
                    .map_err(|e| db_error("Failed to stream entities", e))
                    .boxed();

                Ok(ReadResult::Stream(stream))
            }
        }
    }

    async fn save<E: Entity>(&mut self, entities: Vec<E>) -> Result<Vec<E>, DomainError> {
        let mut saved = Vec::with_capacity(entities.len());

        for entity in &entities {
            let statement = sql::upsert(entity);
            let row = bind_values!(sqlx::query_as::<_, E>(&statement.sql), statement.args)
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| db_error("Failed to save entity", e))?;
            saved.push(row);
        }

        Ok(saved)
    }

    async fn delete<E: Entity>(&mut self, entities: Vec<E>) -> Result<u64, DomainError> {
        if entities.is_empty() {
            return Ok(0);
        }

        let statement = sql::delete(&entities);
        let result = bind_values!(sqlx::query(&statement.sql), statement.args)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to delete entities", e))?;

        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_adds_context() {
        let error = db_error("Failed to save entity", sqlx::Error::PoolTimedOut);
        match error {
            DomainError::Storage { message } => {
                assert!(message.starts_with("Failed to save entity: "));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_postgres_config() {
        let config = PostgresConfig::new("postgres://localhost/tappweb").with_max_connections(4);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.min_connections, 1);
    }
}
