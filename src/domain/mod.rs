//! Domain layer - Core entities, query model and repository contracts

pub mod entity;
pub mod error;
pub mod query;
pub mod role;
pub mod traits;
pub mod user;
pub mod webhook;

pub use entity::{Entity, FieldValue};
pub use error::DomainError;
pub use role::Role;
pub use traits::{Database, Repository};
pub use user::User;
pub use webhook::{WebhookPayload, WebhookUrl};
