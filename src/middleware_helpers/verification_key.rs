use crate::errors::ServiceError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Header carrying the shared client key.
pub const VERIFY_HEADER: &str = "verifyme";

/// Paths served without a client key.
const OPEN_PREFIXES: [&str; 4] = ["/uploads/", "/health", "/swagger-ui", "/api-docs"];

/// Keys accepted in the `verifyme` header. Empty means the check is off.
#[derive(Clone, Debug, Default)]
pub struct VerificationKeys(Arc<Vec<String>>);

impl VerificationKeys {
    pub fn new(keys: Vec<String>) -> Self {
        Self(Arc::new(keys))
    }

    pub fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        self.0.iter().any(|key| key == candidate)
    }
}

/// Rejects requests that do not present a known client key.
pub async fn verification_key_middleware(
    State(keys): State<VerificationKeys>,
    request: Request,
    next: Next,
) -> Response {
    if !keys.is_enabled() {
        return next.run(request).await;
    }

    let path = request.uri().path();
    let open = OPEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix));
    let presented = request
        .headers()
        .get(VERIFY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| keys.accepts(v))
        .unwrap_or(false);

    if open || presented {
        next.run(request).await
    } else {
        tracing::debug!(path, "rejected request without a valid verify key");
        ServiceError::Forbidden("Access Denied".into()).into_response()
    }
}
