//! Migration commands

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::traits::Database;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{PgDatabase, PostgresConfig, PostgresMigrator};

async fn connect() -> anyhow::Result<PgDatabase> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging, false);

    let database = PgDatabase::connect(
        &PostgresConfig::new(config.database_url()?).with_max_connections(1),
    )
    .await?;
    Ok(database)
}

/// Report migrations not yet applied and applied versions this binary lacks
pub async fn make_migrations() -> anyhow::Result<()> {
    let database = connect().await?;
    let status = PostgresMigrator::new(database.pool().clone()).status().await?;

    if status.is_up_to_date() {
        info!(applied = status.applied.len(), "No changes detected");
    }

    for migration in &status.pending {
        info!(
            version = migration.version,
            description = %migration.description,
            "Pending migration"
        );
    }

    for version in &status.unknown {
        warn!(version, "Applied migration is unknown to this binary");
    }

    database.close().await;
    Ok(())
}

pub async fn migrate() -> anyhow::Result<()> {
    let database = connect().await?;
    let applied = PostgresMigrator::new(database.pool().clone()).migrate().await?;

    if applied.is_empty() {
        info!("Database is up to date");
    } else {
        info!(versions = ?applied, "Migrations applied");
    }

    database.close().await;
    Ok(())
}

pub async fn rollback() -> anyhow::Result<()> {
    let database = connect().await?;

    match PostgresMigrator::new(database.pool().clone()).rollback().await? {
        Some(version) => info!(version, "Rolled back migration"),
        None => info!("No migrations to roll back"),
    }

    database.close().await;
    Ok(())
}
