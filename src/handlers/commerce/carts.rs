use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::commerce::cart_service::{AddToCartInput, UpdateCartInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{post, put},
    Router,
};
use serde_json::json;

/// Creates the router for cart endpoints
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", post(add_to_cart).get(get_cart))
        .route("/cart/:id", put(update_cart_item).delete(remove_cart_item))
}

/// Add a book to the cart
#[utoipa::path(
    post,
    path = "/cart",
    request_body = AddToCartInput,
    responses(
        (status = 201, description = "Book added to the cart"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing credentials", body = crate::errors::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse)
    ),
    security(("A-Verify" = []), ("VerifyKey" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<AddToCartInput>,
) -> Result<Response, ServiceError> {
    let line = state.services.cart.add_item(user.id, input).await?;
    Ok(created_response("Book added to cart", json!({ "cart": line })))
}

/// List the caller's cart lines with their books
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart lines"),
        (status = 401, description = "Missing credentials", body = crate::errors::ErrorResponse)
    ),
    security(("A-Verify" = []), ("VerifyKey" = [])),
    tag = "Cart"
)]
pub async fn get_cart(State(state): State<AppState>, user: AuthUser) -> Result<Response, ServiceError> {
    let lines = state.services.cart.list(user.id).await?;
    Ok(success_response("OK", json!({ "cart": lines })))
}

async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidJson(input): ValidJson<UpdateCartInput>,
) -> Result<Response, ServiceError> {
    let line = state.services.cart.update_qty(user.id, id, input.qty).await?;
    Ok(success_response("Cart updated", json!({ "cart": line })))
}

async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.cart.remove(user.id, id).await?;
    Ok(success_response("Removed from cart", json!({})))
}
