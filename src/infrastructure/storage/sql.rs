//! Translation of read queries and writes into parameterized SQL
//!
//! Identifiers are only ever taken from an entity's declared column list, so
//! every interpolated name has been checked; values always go through `$n`
//! placeholders.

use crate::domain::entity::{Entity, FieldValue};
use crate::domain::query::{
    hints_sql, FieldFilters, Match, Predicate, ReadQuery, ResultShape, Selector,
};
use crate::domain::DomainError;

/// SQL text plus the values for its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub args: Vec<FieldValue>,
}

#[derive(Default)]
struct Args {
    values: Vec<FieldValue>,
}

impl Args {
    fn push(&mut self, value: FieldValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    fn push_all(&mut self, values: impl IntoIterator<Item = FieldValue>) -> String {
        values
            .into_iter()
            .map(|value| self.push(value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn column<E: Entity>(name: &str) -> Result<&str, DomainError> {
    if E::has_column(name) {
        Ok(name)
    } else {
        Err(DomainError::invalid_query(format!(
            "unknown column '{}' for table '{}'",
            name,
            E::TABLE
        )))
    }
}

fn match_condition<E: Entity>(
    name: &str,
    matching: &Match,
    args: &mut Args,
) -> Result<String, DomainError> {
    let name = column::<E>(name)?;

    match matching {
        Match::One(value) => Ok(format!("{} = {}", name, args.push(value.clone()))),
        Match::Any(values) if values.is_empty() => Err(DomainError::invalid_query(format!(
            "at least one value is required for field '{}'",
            name
        ))),
        Match::Any(values) => Ok(format!(
            "{} IN ({})",
            name,
            args.push_all(values.iter().cloned())
        )),
    }
}

fn predicate_condition<E: Entity>(
    predicate: &Predicate,
    args: &mut Args,
) -> Result<String, DomainError> {
    let name = column::<E>(&predicate.column)?;

    if !predicate.comparison.takes_value() {
        return Ok(format!("{} {}", name, predicate.comparison.sql()));
    }

    let value = predicate.value.clone().ok_or_else(|| {
        DomainError::invalid_query(format!(
            "comparison '{}' on '{}' requires a value",
            predicate.comparison.sql(),
            name
        ))
    })?;

    Ok(format!(
        "{} {} {}",
        name,
        predicate.comparison.sql(),
        args.push(value)
    ))
}

fn group<E: Entity>(
    filters: &FieldFilters,
    joiner: &str,
    args: &mut Args,
) -> Result<Option<String>, DomainError> {
    if filters.is_empty() {
        return Ok(None);
    }

    let conditions = filters
        .iter()
        .map(|(name, matching)| match_condition::<E>(name, matching, args))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(format!("({})", conditions.join(joiner))))
}

fn where_clause<E: Entity>(
    selector: &Selector,
    args: &mut Args,
) -> Result<Option<String>, DomainError> {
    let mut conditions = Vec::new();

    let extra = match selector {
        Selector::PrimaryKey(id) => {
            conditions.push(format!("{} = {}", E::PRIMARY_KEY, args.push((*id).into())));
            &[][..]
        }
        Selector::PrimaryKeys(ids) => {
            if ids.is_empty() {
                return Err(DomainError::invalid_query(
                    "at least one primary key is required",
                ));
            }
            let placeholders = args.push_all(ids.iter().map(|id| FieldValue::from(*id)));
            conditions.push(format!("{} IN ({})", E::PRIMARY_KEY, placeholders));
            &[][..]
        }
        Selector::Field {
            column,
            matching,
            extra,
        } => {
            conditions.push(match_condition::<E>(column, matching, args)?);
            extra.as_slice()
        }
        Selector::Filters { all, any, extra } => {
            conditions.extend(group::<E>(all, " AND ", args)?);
            conditions.extend(group::<E>(any, " OR ", args)?);
            extra.as_slice()
        }
        Selector::Everything => &[][..],
    };

    for predicate in extra {
        conditions.push(predicate_condition::<E>(predicate, args)?);
    }

    if conditions.is_empty() {
        Ok(None)
    } else {
        Ok(Some(conditions.join(" AND ")))
    }
}

fn columns<E: Entity>() -> String {
    E::COLUMNS.join(", ")
}

/// SELECT for a read query
pub fn select<E: Entity>(query: &ReadQuery) -> Result<SqlStatement, DomainError> {
    query.check_columns::<E>()?;

    let mut args = Args::default();
    let mut sql = format!("SELECT {} FROM {}", columns::<E>(), E::TABLE);

    if let Some(condition) = where_clause::<E>(&query.selector, &mut args)? {
        sql.push_str(" WHERE ");
        sql.push_str(&condition);
    }

    match &query.shape {
        ResultShape::First => sql.push_str(" LIMIT 1"),
        ResultShape::All {
            order_by: Some(order_by),
        } => {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                column::<E>(&order_by.column)?,
                order_by.direction.sql()
            ));
        }
        ResultShape::All { order_by: None } | ResultShape::Streamed => {}
        ResultShape::Paged(params) => {
            params.validate()?;
            sql.push_str(&format!(
                " ORDER BY {} LIMIT {} OFFSET {}",
                E::PRIMARY_KEY,
                params.limit(),
                params.offset()
            ));
        }
    }

    if let Some(hints) = hints_sql(&query.hints) {
        sql.push(' ');
        sql.push_str(&hints);
    }

    Ok(SqlStatement {
        sql,
        args: args.values,
    })
}

/// COUNT(*) over the rows a selector matches
pub fn count<E: Entity>(selector: &Selector) -> Result<SqlStatement, DomainError> {
    let mut args = Args::default();
    let mut sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);

    if let Some(condition) = where_clause::<E>(selector, &mut args)? {
        sql.push_str(" WHERE ");
        sql.push_str(&condition);
    }

    Ok(SqlStatement {
        sql,
        args: args.values,
    })
}

/// INSERT, or UPDATE of every non-key column on primary-key conflict
pub fn upsert<E: Entity>(entity: &E) -> SqlStatement {
    let mut args = Args::default();
    let placeholders = args.push_all(entity.values());

    let updates = E::COLUMNS
        .iter()
        .filter(|c| **c != E::PRIMARY_KEY)
        .map(|c| format!("{} = EXCLUDED.{}", c, c))
        .collect::<Vec<_>>();

    let conflict = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    SqlStatement {
        sql: format!(
            "INSERT INTO {table} ({columns}) VALUES ({placeholders}) ON CONFLICT ({pk}) {conflict} RETURNING {columns}",
            table = E::TABLE,
            columns = columns::<E>(),
            placeholders = placeholders,
            pk = E::PRIMARY_KEY,
            conflict = conflict,
        ),
        args: args.values,
    }
}

/// DELETE by primary key
pub fn delete<E: Entity>(entities: &[E]) -> SqlStatement {
    let mut args = Args::default();
    let placeholders = args.push_all(entities.iter().map(|e| FieldValue::from(e.id())));

    SqlStatement {
        sql: format!(
            "DELETE FROM {} WHERE {} IN ({})",
            E::TABLE,
            E::PRIMARY_KEY,
            placeholders
        ),
        args: args.values,
    }
}
