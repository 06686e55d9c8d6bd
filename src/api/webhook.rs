//! Webhook URL registration endpoint

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::api::health::MessageResponse;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiErrorResponse, Json, ValidatedQuery};

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SetWebhookUrlParams {
    /// URL notified by the daily webhook job
    #[validate(length(min = 1, message = "url must not be empty"))]
    pub url: String,
}

/// Register the single webhook URL, replacing any previous one
#[utoipa::path(
    post,
    path = "/set-webhook-url",
    params(SetWebhookUrlParams),
    responses(
        (status = 200, description = "Webhook URL stored", body = MessageResponse),
        (status = 422, description = "Missing or empty url", body = ApiErrorResponse),
        (status = 502, description = "Storage failure", body = ApiErrorResponse)
    ),
    tag = "webhook"
)]
pub async fn set_webhook_url(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<SetWebhookUrlParams>,
) -> Result<impl IntoResponse, ApiError> {
    state.webhook_service.set_url(&params.url).await?;
    Ok(Json(MessageResponse::success()))
}
