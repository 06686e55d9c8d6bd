//! Request extractors guarding endpoints

pub mod auth;

pub use auth::{extract_bearer, verify_bearer, AdminToken, AnyToken, UserToken};
