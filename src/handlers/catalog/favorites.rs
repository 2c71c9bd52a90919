use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::catalog::favorite_service::FavoriteInput,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, post},
    Router,
};
use serde_json::json;

/// Creates the router for favorite endpoints
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/favorite", post(add_favorite).get(list_favorites))
        .route("/favorite/:book_id", delete(remove_favorite))
}

async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<FavoriteInput>,
) -> Result<Response, ServiceError> {
    let favorite = state.services.favorites.add(user.id, input.book_id).await?;
    Ok(created_response("Added to favorites", json!({ "favorite": favorite })))
}

async fn list_favorites(State(state): State<AppState>, user: AuthUser) -> Result<Response, ServiceError> {
    let favorites = state.services.favorites.list(user.id).await?;
    Ok(success_response("OK", json!({ "favorites": favorites })))
}

async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(book_id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.favorites.remove(user.id, book_id).await?;
    Ok(success_response("Removed from favorites", json!({})))
}
