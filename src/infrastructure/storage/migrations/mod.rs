//! Embedded database migrations
//!
//! Applied versions are tracked in `_migrations`. Each migration runs in its
//! own transaction together with its bookkeeping row.

use sqlx::postgres::PgPool;

use crate::domain::DomainError;

/// A database migration
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub version: i64,
    /// Human-readable description
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
    /// SQL to run when reverting the migration
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// Comparison of embedded migrations with the applied versions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationStatus {
    pub applied: Vec<i64>,
    /// Embedded but not yet applied, in version order
    pub pending: Vec<Migration>,
    /// Applied but unknown to this binary
    pub unknown: Vec<i64>,
}

impl MigrationStatus {
    pub fn compare(migrations: &[Migration], applied: &[i64]) -> Self {
        let mut pending: Vec<Migration> = migrations
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .cloned()
            .collect();
        pending.sort_by_key(|m| m.version);

        let unknown = applied
            .iter()
            .copied()
            .filter(|v| !migrations.iter().any(|m| m.version == *v))
            .collect();

        Self {
            applied: applied.to_vec(),
            pending,
            unknown,
        }
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty() && self.unknown.is_empty()
    }
}

/// PostgreSQL migrator
#[derive(Debug, Clone)]
pub struct PostgresMigrator {
    pool: PgPool,
    migrations: Vec<Migration>,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, schema_migrations())
    }

    pub fn with_migrations(pool: PgPool, migrations: Vec<Migration>) -> Self {
        Self { pool, migrations }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Returns all applied migration versions, ascending
    pub async fn applied_versions(&self) -> Result<Vec<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get applied migrations: {}", e)))
    }

    pub async fn status(&self) -> Result<MigrationStatus, DomainError> {
        let applied = self.applied_versions().await?;
        Ok(MigrationStatus::compare(&self.migrations, &applied))
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))
    }

    async fn revert(&self, migration: &Migration) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::raw_sql(&migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit rollback: {}", e)))
    }

    /// Apply every pending migration, returning the applied versions
    pub async fn migrate(&self) -> Result<Vec<i64>, DomainError> {
        let status = self.status().await?;
        let mut applied = Vec::with_capacity(status.pending.len());

        for migration in &status.pending {
            self.apply(migration).await?;
            tracing::info!(
                version = migration.version,
                description = %migration.description,
                "Applied migration"
            );
            applied.push(migration.version);
        }

        Ok(applied)
    }

    /// Revert the latest applied migration, if any
    pub async fn rollback(&self) -> Result<Option<i64>, DomainError> {
        let Some(latest) = self.applied_versions().await?.last().copied() else {
            return Ok(None);
        };

        let migration = self
            .migrations
            .iter()
            .find(|m| m.version == latest)
            .ok_or_else(|| {
                DomainError::storage(format!(
                    "Applied migration {} is unknown to this binary",
                    latest
                ))
            })?;

        self.revert(migration).await?;
        tracing::info!(
            version = migration.version,
            description = %migration.description,
            "Reverted migration"
        );

        Ok(Some(latest))
    }
}

/// Schema for users and the webhook URL
pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create users table",
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
            r#"
            DROP TABLE IF EXISTS users;
            "#,
        ),
        Migration::new(
            2,
            "Create webhook_url table",
            r#"
            CREATE TABLE IF NOT EXISTS webhook_url (
                id UUID PRIMARY KEY,
                url TEXT NOT NULL
            );
            "#,
            r#"
            DROP TABLE IF EXISTS webhook_url;
            "#,
        ),
        Migration::new(
            3,
            "Allow a single webhook_url row",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS webhook_url_singleton ON webhook_url ((true));
            "#,
            r#"
            DROP INDEX IF EXISTS webhook_url_singleton;
            "#,
        ),
    ]
}
