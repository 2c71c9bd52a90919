use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::commerce::library_service::LibraryInput,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

/// Creates the router for library and order history endpoints
pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/library", post(add_to_library).get(list_library))
        .route("/library/:book_id", delete(remove_from_library))
        .route("/orders", get(list_orders))
}

async fn add_to_library(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<LibraryInput>,
) -> Result<Response, ServiceError> {
    let entry = state.services.library.add(user.id, input).await?;
    Ok(created_response("Book added to library", json!({ "library": entry })))
}

async fn list_library(State(state): State<AppState>, user: AuthUser) -> Result<Response, ServiceError> {
    let listing = state.services.library.list(user.id).await?;
    Ok(success_response("OK", listing))
}

async fn remove_from_library(
    State(state): State<AppState>,
    user: AuthUser,
    Path(book_id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.library.remove(user.id, book_id).await?;
    Ok(success_response("Book removed from library", json!({})))
}

async fn list_orders(State(state): State<AppState>, user: AuthUser) -> Result<Response, ServiceError> {
    let orders = state.services.orders.list(user.id).await?;
    let transactions = state.services.orders.transactions(user.id).await?;
    Ok(success_response(
        "OK",
        json!({ "orders": orders, "transactions": transactions }),
    ))
}
