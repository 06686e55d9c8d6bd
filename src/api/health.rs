//! Liveness endpoints

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::types::Json;

/// `{"message": "..."}` body shared by simple endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn success() -> Self {
        Self {
            message: "success".to_string(),
        }
    }
}

/// Returns 200 while the process is serving requests
#[utoipa::path(
    get,
    path = "/healthcheck",
    responses((status = 200, description = "Service is up", body = MessageResponse)),
    tag = "health"
)]
pub async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse::success())
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = MessageResponse)),
    tag = "health"
)]
pub async fn root() -> Json<MessageResponse> {
    health_check().await
}
