use crate::{
    auth::{AuthUser, StaffUser},
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::commerce::coupon_service::CouponInput,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

/// Creates the router for coupon endpoints
pub fn coupons_routes() -> Router<AppState> {
    Router::new()
        .route("/coupon", get(list_coupons).post(create_coupon))
        .route("/coupons", get(list_coupons))
        .route("/coupon/check", get(check_coupon))
        .route("/coupon/:id", put(update_coupon).delete(delete_coupon))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CouponQuery {
    pub coupon: Option<String>,
}

async fn list_coupons(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let coupons = state.services.coupons.list().await?;
    Ok(success_response("OK", json!({ "coupons": coupons })))
}

async fn create_coupon(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    ValidJson(input): ValidJson<CouponInput>,
) -> Result<Response, ServiceError> {
    let coupon = state.services.coupons.create(input).await?;
    Ok(created_response("Coupon created successfully", json!({ "coupon": coupon })))
}

async fn update_coupon(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
    ValidJson(input): ValidJson<CouponInput>,
) -> Result<Response, ServiceError> {
    let coupon = state.services.coupons.update(id, input).await?;
    Ok(success_response("Coupon updated successfully", json!({ "coupon": coupon })))
}

async fn delete_coupon(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.coupons.delete(id).await?;
    Ok(success_response("Coupon deleted successfully", json!({})))
}

/// Check whether a coupon can still be redeemed
#[utoipa::path(
    get,
    path = "/coupon/check",
    params(CouponQuery),
    responses(
        (status = 200, description = "Coupon is redeemable"),
        (status = 400, description = "Invalid Coupon", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing credentials", body = crate::errors::ErrorResponse)
    ),
    security(("A-Verify" = []), ("VerifyKey" = [])),
    tag = "Coupons"
)]
pub async fn check_coupon(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<CouponQuery>,
) -> Result<Response, ServiceError> {
    let code = query.coupon.unwrap_or_default();
    let coupon = state.services.coupons.check(&code).await?;
    Ok(success_response("OK", json!({ "coupon": coupon })))
}
