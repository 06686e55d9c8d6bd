//! OpenAPI documentation
//!
//! Served with Swagger UI only in debug mode.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::health::MessageResponse;
use super::types::{ApiErrorResponse, ErrorBody, ValidationIssue};
use super::user::{CreateUserRequest, UserResponse};

pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    paths(
        super::health::root,
        super::health::health_check,
        super::user::create_user,
        super::webhook::set_webhook_url,
    ),
    components(schemas(
        CreateUserRequest,
        UserResponse,
        MessageResponse,
        ApiErrorResponse,
        ErrorBody,
        ValidationIssue,
    )),
    tags(
        (name = "health", description = "Liveness checks"),
        (name = "users", description = "User management"),
        (name = "webhook", description = "Webhook URL registration"),
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/docs` backed by the generated document
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi())
}
