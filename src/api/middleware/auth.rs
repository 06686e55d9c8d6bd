//! Bearer token extractors
//!
//! Each extractor pulls the token from the `Authorization` header and
//! verifies it against the role it requires.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{DomainError, Role};
use crate::infrastructure::auth::Claims;

/// Extract the credentials of a `Bearer` authorization header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, DomainError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| DomainError::unauthorized("Not authenticated"))?
        .to_str()
        .map_err(|_| DomainError::unauthorized("Invalid authorization header"))?;

    let (scheme, credentials) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| DomainError::unauthorized("Not authenticated"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(DomainError::unauthorized("Invalid authentication scheme"));
    }

    let credentials = credentials.trim();
    if credentials.is_empty() {
        return Err(DomainError::unauthorized("Not authenticated"));
    }

    Ok(credentials)
}

/// Extract and verify the bearer token, requiring `role` when given
pub fn verify_bearer(
    headers: &HeaderMap,
    state: &AppState,
    role: Option<Role>,
) -> Result<Claims, ApiError> {
    let token = extract_bearer(headers)?;
    debug!(required_role = ?role, "Validating bearer token");
    Ok(state.tokens.decode(token, role)?)
}

macro_rules! token_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub Claims);

        impl FromRequestParts<AppState> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                verify_bearer(&parts.headers, state, $role).map($name)
            }
        }
    };
}

token_extractor!(
    /// Valid token carrying the `User` role
    UserToken,
    Some(Role::User)
);
token_extractor!(
    /// Valid token carrying the `Admin` role
    AdminToken,
    Some(Role::Admin)
);
token_extractor!(
    /// Any valid token, regardless of role
    AnyToken,
    None
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::{MockUserServiceTrait, MockWebhookUrlServiceTrait};
    use crate::infrastructure::auth::{TokenConfig, TokenService};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;

    fn state() -> AppState {
        let tokens = TokenService::new(&TokenConfig::new("secret", "HS256")).unwrap();
        AppState::new(
            Arc::new(MockUserServiceTrait::new()),
            Arc::new(MockWebhookUrlServiceTrait::new()),
            Arc::new(tokens),
        )
    }

    fn parts_with(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extract_bearer_token() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&parts.headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        let parts = parts_with(None);
        assert!(matches!(
            extract_bearer(&parts.headers),
            Err(DomainError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let parts = parts_with(Some("Bearer"));
        assert!(matches!(
            extract_bearer(&parts.headers),
            Err(DomainError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_non_bearer_scheme() {
        let parts = parts_with(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(
            extract_bearer(&parts.headers),
            Err(DomainError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_user_token_accepts_user_role() {
        let state = state();
        let token = state
            .tokens
            .encode(Claims::new(), Some(Role::User), chrono::Duration::minutes(5))
            .unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));

        let UserToken(claims) = UserToken::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(claims["role"], 3);
    }

    #[tokio::test]
    async fn test_admin_token_rejects_user_role() {
        let state = state();
        let token = state
            .tokens
            .encode(Claims::new(), Some(Role::User), chrono::Duration::minutes(5))
            .unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));

        let err = AdminToken::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_any_token_rejects_garbage() {
        let state = state();
        let mut parts = parts_with(Some("Bearer not-a-token"));

        let err = AnyToken::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_any_token_rejects_expired() {
        let state = state();
        let token = state
            .tokens
            .encode(Claims::new(), None, chrono::Duration::seconds(-10))
            .unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {}", token)));

        let err = AnyToken::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"], "Token has expired");
    }
}
