//! Storage infrastructure - generic repository backends

mod in_memory;
pub mod migrations;
mod postgres;
pub mod sql;

pub use in_memory::{InMemoryDatabase, InMemoryRepository};
pub use migrations::{schema_migrations, Migration, MigrationStatus, PostgresMigrator};
pub use postgres::{PgDatabase, PgRepository, PostgresConfig};
