//! In-memory database
//!
//! Useful for testing and for running without PostgreSQL. Data is lost when
//! the process terminates. Rows are kept as JSON per table; a unit of work
//! stages its writes and applies them on commit, and sees its own staged
//! writes when reading.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::Entity;
use crate::domain::query::{
    Direction, FieldFilters, Page, Predicate, ReadQuery, ReadResult, ResultShape, Selector,
};
use crate::domain::traits::{Database, Repository};
use crate::domain::DomainError;

type Table = Vec<(Uuid, Value)>;
type Tables = HashMap<&'static str, Table>;

#[derive(Debug, Clone)]
enum StagedWrite {
    Upsert {
        table: &'static str,
        id: Uuid,
        row: Value,
        max_rows: Option<usize>,
    },
    Delete {
        table: &'static str,
        id: Uuid,
    },
}

impl StagedWrite {
    fn table(&self) -> &'static str {
        match self {
            Self::Upsert { table, .. } | Self::Delete { table, .. } => table,
        }
    }

    /// Apply to a table, keeping insertion order for upserts of existing rows
    fn apply(&self, rows: &mut Table) {
        match self {
            Self::Upsert { id, row, .. } => match rows.iter_mut().find(|(key, _)| key == id) {
                Some((_, existing)) => *existing = row.clone(),
                None => rows.push((*id, row.clone())),
            },
            Self::Delete { id, .. } => rows.retain(|(key, _)| key != id),
        }
    }
}

/// Shared in-memory database
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    type Repo = InMemoryRepository;

    async fn begin(&self) -> Result<InMemoryRepository, DomainError> {
        Ok(InMemoryRepository {
            tables: self.tables.clone(),
            staged: Vec::new(),
        })
    }
}

/// Unit of work over an `InMemoryDatabase`
#[derive(Debug)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
    staged: Vec<StagedWrite>,
}

impl InMemoryRepository {
    /// Committed rows of a table with this unit of work's writes applied
    async fn rows<E: Entity>(&self) -> Result<Vec<E>, DomainError> {
        let mut rows = self
            .tables
            .read()
            .await
            .get(E::TABLE)
            .cloned()
            .unwrap_or_default();

        for write in self.staged.iter().filter(|w| w.table() == E::TABLE) {
            write.apply(&mut rows);
        }

        rows.into_iter()
            .map(|(_, row)| {
                serde_json::from_value(row).map_err(|e| {
                    DomainError::storage(format!("Failed to deserialize entity: {}", e))
                })
            })
            .collect()
    }
}

fn matches_filters<E: Entity>(entity: &E, filters: &FieldFilters, any: bool) -> bool {
    let mut results = filters.iter().map(|(column, matching)| {
        entity
            .field(column)
            .is_some_and(|value| matching.accepts(&value))
    });

    if any {
        results.any(|r| r)
    } else {
        results.all(|r| r)
    }
}

fn matches_extra<E: Entity>(entity: &E, extra: &[Predicate]) -> bool {
    extra
        .iter()
        .all(|predicate| predicate.accepts(entity.field(&predicate.column).as_ref()))
}

fn selects<E: Entity>(entity: &E, selector: &Selector) -> bool {
    match selector {
        Selector::PrimaryKey(id) => entity.id() == *id,
        Selector::PrimaryKeys(ids) => ids.contains(&entity.id()),
        Selector::Field {
            column,
            matching,
            extra,
        } => {
            entity
                .field(column)
                .is_some_and(|value| matching.accepts(&value))
                && matches_extra(entity, extra)
        }
        Selector::Filters { all, any, extra } => {
            (all.is_empty() || matches_filters(entity, all, false))
                && (any.is_empty() || matches_filters(entity, any, true))
                && matches_extra(entity, extra)
        }
        Selector::Everything => true,
    }
}

fn compare_column<E: Entity>(a: &E, b: &E, column: &str) -> Ordering {
    a.field(column)
        .partial_cmp(&b.field(column))
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn read<'a, E: Entity>(
        &'a mut self,
        query: ReadQuery,
    ) -> Result<ReadResult<'a, E>, DomainError> {
        query.check_columns::<E>()?;

        let mut matched: Vec<E> = self
            .rows::<E>()
            .await?
            .into_iter()
            .filter(|entity| selects(entity, &query.selector))
            .collect();

        match query.shape {
            ResultShape::First => Ok(ReadResult::One(matched.into_iter().next())),
            ResultShape::All { order_by } => {
                if let Some(order_by) = order_by {
                    matched.sort_by(|a, b| {
                        let ordering = compare_column(a, b, &order_by.column);
                        match order_by.direction {
                            Direction::Asc => ordering,
                            Direction::Desc => ordering.reverse(),
                        }
                    });
                }
                Ok(ReadResult::Many(matched))
            }
            ResultShape::Paged(params) => {
                params.validate()?;
                matched.sort_by_key(|entity| entity.id());

                let total = matched.len() as u64;
                let items = matched
                    .into_iter()
                    .skip(params.offset() as usize)
                    .take(params.limit() as usize)
                    .collect();

                Ok(ReadResult::Page(Page::new(items, total, params)))
            }
            ResultShape::Streamed => Ok(ReadResult::Stream(
                futures::stream::iter(matched.into_iter().map(Ok)).boxed(),
            )),
        }
    }

    async fn save<E: Entity>(&mut self, entities: Vec<E>) -> Result<Vec<E>, DomainError> {
        for entity in &entities {
            let row = serde_json::to_value(entity).map_err(|e| {
                DomainError::storage(format!("Failed to serialize entity: {}", e))
            })?;

            self.staged.push(StagedWrite::Upsert {
                table: E::TABLE,
                id: entity.id(),
                row,
                max_rows: E::MAX_ROWS,
            });
        }

        Ok(entities)
    }

    async fn delete<E: Entity>(&mut self, entities: Vec<E>) -> Result<u64, DomainError> {
        let mut existing: HashSet<Uuid> =
            self.rows::<E>().await?.iter().map(|e| e.id()).collect();
        let mut removed = 0;

        for entity in entities {
            let id = entity.id();
            if existing.remove(&id) {
                removed += 1;
            }

            self.staged.push(StagedWrite::Delete {
                table: E::TABLE,
                id,
            });
        }

        Ok(removed)
    }

    /// Apply staged writes atomically; a table pushed past its row limit
    /// fails the whole commit with `AlreadyExists`
    async fn commit(self) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        let mut changed: HashMap<&'static str, Table> = HashMap::new();
        let mut limits: HashMap<&'static str, usize> = HashMap::new();

        for write in &self.staged {
            let rows = changed
                .entry(write.table())
                .or_insert_with(|| tables.get(write.table()).cloned().unwrap_or_default());
            write.apply(rows);

            if let StagedWrite::Upsert {
                table,
                max_rows: Some(max_rows),
                ..
            } = write
            {
                limits.insert(*table, *max_rows);
            }
        }

        for (table, max_rows) in limits {
            let count = changed.get(table).map_or(0, Vec::len);
            if count > max_rows {
                return Err(DomainError::already_exists(format!(
                    "Table {} holds at most {} row(s)",
                    table, max_rows
                )));
            }
        }

        tables.extend(changed);
        Ok(())
    }
}
