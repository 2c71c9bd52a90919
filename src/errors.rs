use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// One failed field in a rejected request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error body returned by every failing route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `false`
    pub status: bool,
    pub message: String,
    /// Field-level messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field));
                    FieldError::new(camel_case(field), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ServiceError::ValidationError(fields)
    }
}

/// Field names are reported the way clients send them.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ServiceError::HashError(err.to_string())
    }
}

impl ServiceError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ServiceError::ValidationError(vec![FieldError::new(field, message)])
    }

    /// Turns a unique-constraint violation into `conflict`; other failures stay database errors.
    pub fn on_unique_violation(err: DbErr, conflict: ServiceError) -> ServiceError {
        if Self::is_unique_violation(&err) {
            conflict
        } else {
            ServiceError::DatabaseError(err)
        }
    }

    pub fn is_unique_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_)
            | Self::HashError(_)
            | Self::JwtError(_)
            | Self::StorageError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    pub fn response_message(&self) -> String {
        match self {
            Self::ValidationError(_) => "Error".to_string(),
            Self::DatabaseError(_)
            | Self::HashError(_)
            | Self::JwtError(_)
            | Self::StorageError(_)
            | Self::Other(_) => "Server Error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            status: false,
            message: self.response_message(),
            errors: match self {
                ServiceError::ValidationError(fields) => Some(fields),
                _ => None,
            },
            request_id: current_request_id(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracing::{scope_request_id, RequestId};
    use axum::body::to_bytes;
    use serde_json::Value;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        rate: i32,
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::ValidationError(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        assert_eq!(
            ServiceError::HashError("salt exploded".into()).response_message(),
            "Server Error"
        );
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("table missing".into())).response_message(),
            "Server Error"
        );
        assert_eq!(
            ServiceError::BadRequest("Invalid Coupon".into()).response_message(),
            "Invalid Coupon"
        );
    }

    #[test]
    fn validation_errors_become_field_messages() {
        let probe = Probe {
            name: String::new(),
            rate: 9,
        };
        let err: ServiceError = probe.validate().unwrap_err().into();
        match err {
            ServiceError::ValidationError(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0], FieldError::new("name", "Name is required"));
                assert_eq!(fields[1].field, "rate");
                assert_eq!(fields[1].message, "Invalid rate");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn field_names_are_camel_cased() {
        assert_eq!(camel_case("tra_id"), "traId");
        assert_eq!(camel_case("price_in_month"), "priceInMonth");
        assert_eq!(camel_case("bookId"), "bookId");
        assert_eq!(camel_case("name"), "name");
    }

    #[tokio::test]
    async fn into_response_uses_envelope_and_request_id() {
        let response = scope_request_id(RequestId::new("req-42"), async {
            ServiceError::invalid_field("qty", "Quantity must be a number").into_response()
        })
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], false);
        assert_eq!(json["message"], "Error");
        assert_eq!(json["errors"][0]["field"], "qty");
        assert_eq!(json["requestId"], "req-42");
    }
}
