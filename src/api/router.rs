use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::docs;
use super::health;
use super::state::AppState;
use super::user;
use super::webhook;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(health::root))
        .route("/healthcheck", get(health::health_check))
        .route("/user/", post(user::create_user))
        .route("/set-webhook-url", post(webhook::set_webhook_url));

    if state.debug {
        router = router.merge(docs::swagger_ui());
    }

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::{MockUserServiceTrait, MockWebhookUrlServiceTrait};
    use crate::domain::DomainError;
    use crate::infrastructure::auth::{TokenConfig, TokenService};
    use crate::infrastructure::storage::InMemoryDatabase;
    use crate::infrastructure::webhook::WebhookUrlService;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(&TokenConfig::new("secret", "HS256")).unwrap())
    }

    fn in_memory_state() -> (AppState, Arc<InMemoryDatabase>) {
        let database = Arc::new(InMemoryDatabase::new());
        (AppState::from_database(database.clone(), tokens()), database)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let (state, _) = in_memory_state();

        for uri in ["/", "/healthcheck"] {
            let (status, body) = send(create_router(state.clone()), empty("GET", uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, serde_json::json!({"message": "success"}));
        }
    }

    #[tokio::test]
    async fn test_create_user() {
        let (state, _) = in_memory_state();

        let (status, body) =
            send(create_router(state), post_json("/user/", r#"{"name":"Ann"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ann");
        let id = body["id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_create_user_persists() {
        let (state, _) = in_memory_state();
        let service = state.user_service.clone();

        let (_, body) =
            send(create_router(state), post_json("/user/", r#"{"name":"Ann"}"#)).await;
        let id = uuid::Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();

        let stored = service.get(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ann");
    }

    #[tokio::test]
    async fn test_create_user_missing_name() {
        let (state, _) = in_memory_state();

        let (status, body) = send(create_router(state), post_json("/user/", "{}")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"][0]["loc"], serde_json::json!(["body", "name"]));
    }

    #[tokio::test]
    async fn test_create_user_empty_name() {
        let (state, _) = in_memory_state();

        let (status, body) =
            send(create_router(state), post_json("/user/", r#"{"name":""}"#)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_array());
    }

    #[tokio::test]
    async fn test_create_user_conflict() {
        let mut users = MockUserServiceTrait::new();
        users
            .expect_create_user()
            .returning(|_| Err(DomainError::already_exists("user exists")));

        let state = AppState::new(
            Arc::new(users),
            Arc::new(MockWebhookUrlServiceTrait::new()),
            tokens(),
        );

        let (status, body) =
            send(create_router(state), post_json("/user/", r#"{"name":"Ann"}"#)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, serde_json::json!({"error": "user exists"}));
    }

    #[tokio::test]
    async fn test_storage_failure_is_bad_gateway() {
        let mut users = MockUserServiceTrait::new();
        users
            .expect_create_user()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let state = AppState::new(
            Arc::new(users),
            Arc::new(MockWebhookUrlServiceTrait::new()),
            tokens(),
        );

        let (status, _) =
            send(create_router(state), post_json("/user/", r#"{"name":"Ann"}"#)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_set_webhook_url_twice_keeps_latest() {
        let (state, database) = in_memory_state();

        for url in ["http%3A%2F%2Fa", "http%3A%2F%2Fb"] {
            let uri = format!("/set-webhook-url?url={}", url);
            let (status, body) = send(create_router(state.clone()), empty("POST", &uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, serde_json::json!({"message": "success"}));
        }

        let current = WebhookUrlService::new(database).current().await.unwrap().unwrap();
        assert_eq!(current.url, "http://b");
    }

    #[tokio::test]
    async fn test_set_webhook_url_missing_param() {
        let (state, _) = in_memory_state();

        let (status, body) = send(create_router(state), empty("POST", "/set-webhook-url")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"][0]["loc"], serde_json::json!(["query", "url"]));
    }

    #[tokio::test]
    async fn test_docs_only_in_debug() {
        let (state, _) = in_memory_state();

        let (status, _) =
            send(create_router(state.clone()), empty("GET", "/openapi.json")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let response = create_router(state.clone())
            .oneshot(empty("GET", "/docs/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let debug = state.with_debug(true);
        let (status, body) =
            send(create_router(debug.clone()), empty("GET", "/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        for path in ["/", "/healthcheck", "/user/", "/set-webhook-url"] {
            assert!(body["paths"][path].is_object(), "missing {}", path);
        }
        assert_eq!(
            body["paths"]["/set-webhook-url"]["post"]["parameters"][0]["name"],
            "url"
        );

        let response = create_router(debug)
            .oneshot(empty("GET", "/docs/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let (state, _) = in_memory_state();

        let request = Request::builder()
            .method("GET")
            .uri("/healthcheck")
            .header("origin", "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
