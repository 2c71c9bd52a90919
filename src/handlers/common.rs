use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::IntoParams;
use validator::Validate;

/// Success envelope: `{status: true, message, ...payload}`.
///
/// The payload must serialize to a JSON object; its keys are flattened
/// next to `status` and `message`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data,
        }
    }
}

/// Standard success response
pub fn success_response<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::new(message, data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::new(message, data))).into_response()
}

/// Envelope without payload
pub fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ApiResponse::new(message, json!({})))).into_response()
}

/// JSON body that has been deserialized and validated.
///
/// Malformed bodies become 400 with the parser's message; failed rules
/// become 400 with field-level errors.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Fallback for unknown routes
pub async fn route_not_found() -> Response {
    let body: Value = json!({ "status": false, "message": "Route not found" });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};

    #[derive(Debug, Deserialize, Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/probe")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn envelope_flattens_payload() {
        let value = serde_json::to_value(ApiResponse::new("OK", json!({ "books": [1, 2] }))).unwrap();
        assert_eq!(value, json!({ "status": true, "message": "OK", "books": [1, 2] }));
    }

    #[tokio::test]
    async fn valid_json_rejects_rule_violations() {
        let err = ValidJson::<Probe>::from_request(json_request(r#"{"name":""}"#), &())
            .await
            .unwrap_err();
        match err {
            ServiceError::ValidationError(fields) => assert_eq!(fields[0].message, "Name is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_json_rejects_malformed_bodies() {
        let err = ValidJson::<Probe>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let ValidJson(probe) = ValidJson::<Probe>::from_request(json_request(r#"{"name":"Ada"}"#), &())
            .await
            .unwrap();
        assert_eq!(probe.name, "Ada");
    }

    #[tokio::test]
    async fn unknown_routes_get_the_error_envelope() {
        let response = route_not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "status": false, "message": "Route not found" }));
    }
}
