use crate::{
    auth::{OptionalAuthUser, StaffUser},
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::catalog::book_service::BookInput,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

/// Creates the router for book management and storefront endpoints
pub fn books_routes() -> Router<AppState> {
    Router::new()
        .route("/book", get(list_books).post(create_book))
        .route(
            "/book/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books", get(storefront))
        .route("/books/:id", get(book_detail))
}

async fn list_books(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
) -> Result<Response, ServiceError> {
    let books = state.services.books.list(viewer.reader().map(|u| u.id)).await?;
    Ok(success_response("OK", json!({ "books": books })))
}

async fn get_book(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let detail = state.services.books.detail(id, viewer.reader().as_ref()).await?;
    Ok(success_response("OK", json!({ "book": detail.book })))
}

async fn create_book(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    ValidJson(input): ValidJson<BookInput>,
) -> Result<Response, ServiceError> {
    let book = state.services.books.create(input).await?;
    Ok(created_response("Book created successfully", json!({ "book": book })))
}

async fn update_book(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
    ValidJson(input): ValidJson<BookInput>,
) -> Result<Response, ServiceError> {
    let book = state.services.books.update(id, input).await?;
    Ok(success_response("Book updated successfully", json!({ "book": book })))
}

async fn delete_book(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.books.delete(id).await?;
    Ok(success_response("Book deleted successfully", json!({})))
}

async fn storefront(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
) -> Result<Response, ServiceError> {
    let shelves = state.services.books.storefront(viewer.reader().map(|u| u.id)).await?;
    Ok(success_response("OK", shelves))
}

async fn book_detail(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let detail = state.services.books.detail(id, viewer.reader().as_ref()).await?;
    Ok(success_response("OK", detail))
}
