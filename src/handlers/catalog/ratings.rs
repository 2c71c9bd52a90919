use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::catalog::rating_service::{RatingInput, RatingUpdate},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{post, put},
    Router,
};
use serde_json::json;

/// Creates the router for rating endpoints
pub fn ratings_routes() -> Router<AppState> {
    Router::new()
        .route("/rate", post(create_rating))
        .route("/rate/:id", put(update_rating).delete(delete_rating))
}

async fn create_rating(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<RatingInput>,
) -> Result<Response, ServiceError> {
    let rating = state.services.ratings.create(&user, input).await?;
    Ok(created_response("Rating added successfully", json!({ "rating": rating })))
}

async fn update_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidJson(input): ValidJson<RatingUpdate>,
) -> Result<Response, ServiceError> {
    let rating = state.services.ratings.update(&user, id, input).await?;
    Ok(success_response("Rating updated successfully", json!({ "rating": rating })))
}

async fn delete_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.ratings.delete(&user, id).await?;
    Ok(success_response("Rating deleted successfully", json!({})))
}
