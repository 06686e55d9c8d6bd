//! Error responses
//!
//! Domain errors become `{"error": "<message>"}`; request validation failures
//! become `{"error": [{"loc": [...], "msg": "...", "type": "..."}]}` with 422.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// One request validation problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    /// Location, e.g. `["body", "name"]` or `["query", "url"]`
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    pub fn new(
        loc: impl IntoIterator<Item = impl Into<String>>,
        msg: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorBody {
    Message(String),
    Validation(Vec<ValidationIssue>),
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorBody,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ErrorBody::Message(message.into()),
            },
        }
    }

    /// 422 with a list of validation issues
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        warn!(issues = ?issues, "RequestValidationError");

        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            response: ApiErrorResponse {
                error: ErrorBody::Validation(issues),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

/// Status for a domain error; anything unclassified is a bad gateway
pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        DomainError::Unauthorized { .. }
        | DomainError::InvalidToken
        | DomainError::ExpiredToken => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden { .. } => StatusCode::FORBIDDEN,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::AlreadyExists { .. } => StatusCode::CONFLICT,
        DomainError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::InvalidQuery { .. }
        | DomainError::Storage { .. }
        | DomainError::Configuration { .. }
        | DomainError::Internal { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = status_for(&err);

        if status.is_server_error() {
            error!(kind = err.kind(), status = status.as_u16(), error = %err, "Request failed");
        } else {
            warn!(kind = err.kind(), status = status.as_u16(), error = %err, "Request failed");
        }

        Self::new(status, err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_statuses() {
        let cases = [
            (DomainError::bad_request("x"), StatusCode::BAD_REQUEST),
            (DomainError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (DomainError::InvalidToken, StatusCode::UNAUTHORIZED),
            (DomainError::ExpiredToken, StatusCode::UNAUTHORIZED),
            (DomainError::forbidden("x"), StatusCode::FORBIDDEN),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::already_exists("x"), StatusCode::CONFLICT),
            (DomainError::unprocessable("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::invalid_query("x"), StatusCode::BAD_GATEWAY),
            (DomainError::storage("x"), StatusCode::BAD_GATEWAY),
            (DomainError::internal("x"), StatusCode::BAD_GATEWAY),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_message_body() {
        let err = ApiError::from(DomainError::ExpiredToken);
        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Token has expired"}));
    }

    #[test]
    fn test_validation_body() {
        let err = ApiError::validation(vec![ValidationIssue::new(
            ["body", "name"],
            "field required",
            "missing",
        )]);

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": [{"loc": ["body", "name"], "msg": "field required", "type": "missing"}]})
        );
    }
}
