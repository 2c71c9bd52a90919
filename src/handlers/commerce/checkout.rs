use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, ValidJson},
    services::commerce::checkout_service::CheckoutInput,
    AppState,
};
use axum::{extract::State, response::Response, routing::post, Router};

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/checkout", post(checkout))
}

/// Buy every purchasable book in the caller's cart
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutInput,
    responses(
        (status = 201, description = "Order placed; returns order, library items and royalty accruals"),
        (status = 400, description = "Empty cart, nothing purchasable or invalid coupon", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing credentials", body = crate::errors::ErrorResponse),
        (status = 409, description = "Cart changed during checkout", body = crate::errors::ErrorResponse)
    ),
    security(("A-Verify" = []), ("VerifyKey" = [])),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<CheckoutInput>,
) -> Result<Response, ServiceError> {
    let receipt = state.services.checkout.checkout(user.id, input).await?;
    Ok(created_response("Order placed successfully", receipt))
}
