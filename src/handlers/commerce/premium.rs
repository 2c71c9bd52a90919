use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::commerce::subscription_service::{PurchasePlanInput, RecordPremiumInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, post},
    Router,
};
use serde_json::json;

/// Creates the router for premium subscription endpoints
pub fn premium_routes() -> Router<AppState> {
    Router::new()
        .route("/premium", post(record_premium).get(list_premium))
        .route("/premium/purchase", post(purchase_premium))
        .route("/premium/:plan_id", delete(cancel_premium))
}

async fn record_premium(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<RecordPremiumInput>,
) -> Result<Response, ServiceError> {
    let premium = state.services.subscriptions.record(user.id, input).await?;
    Ok(created_response(
        "Premium subscription created",
        json!({ "premium": premium }),
    ))
}

/// Buy a subscription plan
#[utoipa::path(
    post,
    path = "/premium/purchase",
    request_body = PurchasePlanInput,
    responses(
        (status = 201, description = "Subscription started; returns the order and the premium grant"),
        (status = 400, description = "Already subscribed or invalid coupon", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing credentials", body = crate::errors::ErrorResponse),
        (status = 404, description = "Plan not found", body = crate::errors::ErrorResponse)
    ),
    security(("A-Verify" = []), ("VerifyKey" = [])),
    tag = "Subscriptions"
)]
pub async fn purchase_premium(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<PurchasePlanInput>,
) -> Result<Response, ServiceError> {
    let receipt = state.services.subscriptions.purchase(user.id, input).await?;
    Ok(created_response("Subscription purchased successfully", receipt))
}

async fn list_premium(State(state): State<AppState>, user: AuthUser) -> Result<Response, ServiceError> {
    let premiums = state.services.subscriptions.list(user.id).await?;
    Ok(success_response("OK", json!({ "premiums": premiums })))
}

async fn cancel_premium(
    State(state): State<AppState>,
    user: AuthUser,
    Path(plan_id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.subscriptions.cancel(user.id, plan_id).await?;
    Ok(success_response("Subscription cancelled", json!({})))
}
