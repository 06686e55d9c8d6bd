//! User entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::{Entity, FieldValue};

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a fresh id and both timestamps set to now
    pub fn create(name: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["id", "name", "created_at", "updated_at"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            "created_at" => Some(self.created_at.into()),
            "updated_at" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user() {
        let user = User::create("Ann");
        assert_eq!(user.name, "Ann");
        assert_eq!(user.created_at, user.updated_at);
        assert_ne!(User::create("Ann").id, user.id);
    }

    #[test]
    fn test_values_follow_columns() {
        let user = User::create("Ann");
        let values = user.values();
        assert_eq!(values.len(), User::COLUMNS.len());
        assert_eq!(values[0], FieldValue::Uuid(user.id));
        assert_eq!(values[1], FieldValue::from("Ann"));
        assert!(user.field("email").is_none());
        assert!(!User::has_column("email"));
    }
}
