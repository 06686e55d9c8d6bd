//! Entity abstraction shared by every persisted record type

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use uuid::Uuid;

/// A column value used in selectors, predicates and generic writes
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Uuid(Uuid),
    Boolean(bool),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    /// Text view used by `LIKE` matching in the in-memory backend
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Uuid> for FieldValue {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

/// A persisted record type
///
/// `COLUMNS` is the authoritative column list: query translation rejects any
/// column name that is not listed here, and generic upserts write every
/// column in this order.
pub trait Entity:
    Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + for<'r> sqlx::FromRow<'r, PgRow>
    + Send
    + Sync
    + Unpin
    + 'static
{
    /// Table name
    const TABLE: &'static str;

    /// Primary key column
    const PRIMARY_KEY: &'static str = "id";

    /// All columns, primary key included
    const COLUMNS: &'static [&'static str];

    /// Most rows the table may hold, `None` for unbounded
    const MAX_ROWS: Option<usize> = None;

    /// Primary key value
    fn id(&self) -> Uuid;

    /// Value of a column, `None` for unknown columns
    fn field(&self, column: &str) -> Option<FieldValue>;

    fn has_column(column: &str) -> bool {
        Self::COLUMNS.contains(&column)
    }

    /// Column values in `COLUMNS` order
    fn values(&self) -> Vec<FieldValue> {
        Self::COLUMNS
            .iter()
            .filter_map(|column| self.field(column))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_conversions() {
        let id = Uuid::new_v4();
        assert_eq!(FieldValue::from(id), FieldValue::Uuid(id));
        assert_eq!(FieldValue::from("ann"), FieldValue::Text("ann".to_string()));
        assert_eq!(FieldValue::from(7), FieldValue::Integer(7));
        assert_eq!(FieldValue::from(true), FieldValue::Boolean(true));
    }

    #[test]
    fn test_field_value_ordering_within_type() {
        assert!(FieldValue::from("a") < FieldValue::from("b"));
        assert!(FieldValue::from(1) < FieldValue::from(2));
    }

    #[test]
    fn test_as_text() {
        assert_eq!(FieldValue::from("x").as_text(), Some("x"));
        assert_eq!(FieldValue::from(1).as_text(), None);
    }
}
