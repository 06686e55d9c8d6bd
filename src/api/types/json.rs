//! Extractors that report rejections as validation issues

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::error::{ApiError, ValidationIssue};

/// JSON body extractor; rejections become 422 validation issues
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::validation(vec![json_rejection_issue(&rejection)])),
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

/// JSON body extractor that also runs `validator` rules on the value
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|errors| ApiError::validation(validation_issues("body", &errors)))?;
        Ok(ValidatedJson(value))
    }
}

/// Query string extractor with validation; rejections become 422 issues
#[derive(Debug, Clone, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    ApiError::validation(vec![deserialize_issue("query", &rejection.body_text())])
                })?;

        value
            .validate()
            .map_err(|errors| ApiError::validation(validation_issues("query", &errors)))?;
        Ok(ValidatedQuery(value))
    }
}

fn json_rejection_issue(rejection: &axum::extract::rejection::JsonRejection) -> ValidationIssue {
    use axum::extract::rejection::JsonRejection::*;

    match rejection {
        JsonDataError(err) => deserialize_issue("body", &err.body_text()),
        JsonSyntaxError(err) => {
            ValidationIssue::new(["body"], err.body_text(), "json_invalid")
        }
        MissingJsonContentType(_) => ValidationIssue::new(
            ["body"],
            "Expected request with `Content-Type: application/json`",
            "content_type",
        ),
        other => ValidationIssue::new(["body"], other.body_text(), "value_error"),
    }
}

/// Turn a serde message into an issue, locating `missing field` errors
fn deserialize_issue(source: &str, text: &str) -> ValidationIssue {
    match missing_field(text) {
        Some(field) => ValidationIssue::new([source, field], "field required", "missing"),
        None => ValidationIssue::new([source], text, "value_error"),
    }
}

fn missing_field(text: &str) -> Option<&str> {
    let rest = &text[text.find("missing field `")? + "missing field `".len()..];
    rest.split('`').next()
}

fn validation_issues(source: &str, errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues: Vec<ValidationIssue> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let msg = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", err.code));
                ValidationIssue::new([source.to_string(), field.to_string()], msg, err.code.to_string())
            })
        })
        .collect();

    issues.sort_by(|a, b| a.loc.cmp(&b.loc));
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct NameBody {
        #[validate(length(min = 1, message = "name must not be empty"))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(
            missing_field("Failed to deserialize: missing field `url` at line 1"),
            Some("url")
        );
        assert_eq!(missing_field("invalid type: integer"), None);
    }

    #[tokio::test]
    async fn test_validated_json_accepts_valid_body() {
        let ValidatedJson(body) =
            ValidatedJson::<NameBody>::from_request(json_request(r#"{"name":"ann"}"#), &())
                .await
                .unwrap();
        assert_eq!(body.name, "ann");
    }

    #[tokio::test]
    async fn test_validated_json_missing_field() {
        let err = ValidatedJson::<NameBody>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"][0]["loc"], serde_json::json!(["body", "name"]));
        assert_eq!(body["error"][0]["type"], "missing");
    }

    #[tokio::test]
    async fn test_validated_json_empty_name() {
        let err = ValidatedJson::<NameBody>::from_request(json_request(r#"{"name":""}"#), &())
            .await
            .unwrap_err();

        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"][0]["loc"], serde_json::json!(["body", "name"]));
        assert_eq!(body["error"][0]["msg"], "name must not be empty");
        assert_eq!(body["error"][0]["type"], "length");
    }

    #[tokio::test]
    async fn test_json_syntax_error() {
        let err = Json::<NameBody>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"][0]["type"], "json_invalid");
    }

    #[tokio::test]
    async fn test_validated_query_missing_param() {
        #[derive(Debug, Deserialize, Validate)]
        struct UrlQuery {
            #[allow(dead_code)]
            url: String,
        }

        let (mut parts, _) = Request::builder()
            .uri("/set-webhook-url")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let err = ValidatedQuery::<UrlQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"][0]["loc"], serde_json::json!(["query", "url"]));
        assert_eq!(body["error"][0]["msg"], "field required");
    }
}
