//! Request extractors and error response types

pub mod error;
pub mod json;

pub use error::{ApiError, ApiErrorResponse, ErrorBody, ValidationIssue};
pub use json::{Json, ValidatedJson, ValidatedQuery};
