use crate::{
    auth::StaffUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::catalog::author_service::AuthorInput,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

/// Creates the router for author endpoints; all staff only
pub fn authors_routes() -> Router<AppState> {
    Router::new()
        .route("/author", get(list_authors).post(create_author))
        .route(
            "/author/:id",
            get(get_author).put(update_author).delete(delete_author),
        )
}

async fn list_authors(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
) -> Result<Response, ServiceError> {
    let authors = state.services.authors.list().await?;
    Ok(success_response("OK", json!({ "authors": authors })))
}

async fn get_author(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let author = state.services.authors.detail(id).await?;
    Ok(success_response("OK", json!({ "author": author })))
}

async fn create_author(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    ValidJson(input): ValidJson<AuthorInput>,
) -> Result<Response, ServiceError> {
    let author = state.services.authors.create(input).await?;
    Ok(created_response("Author created successfully", json!({ "author": author })))
}

async fn update_author(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
    ValidJson(input): ValidJson<AuthorInput>,
) -> Result<Response, ServiceError> {
    let author = state.services.authors.update(id, input).await?;
    Ok(success_response("Author updated successfully", json!({ "author": author })))
}

async fn delete_author(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.authors.delete(id).await?;
    Ok(success_response("Author deleted successfully", json!({})))
}
