use crate::{
    auth::StaffUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::content::{BannerInput, FaqInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, put},
    Router,
};
use serde_json::json;

/// Creates the router for banner and FAQ endpoints
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/banners", get(list_banners).post(create_banner))
        .route("/banner", get(list_banners))
        .route("/banners/:id", delete(delete_banner))
        .route("/faq", get(list_faqs).post(create_faq))
        .route("/faq/:id", put(update_faq).delete(delete_faq))
}

async fn list_banners(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let banners = state.services.content.banners().await?;
    Ok(success_response("OK", json!({ "banners": banners })))
}

async fn create_banner(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    ValidJson(input): ValidJson<BannerInput>,
) -> Result<Response, ServiceError> {
    let banner = state.services.content.create_banner(input).await?;
    Ok(created_response("Banner created", json!({ "banner": banner })))
}

async fn delete_banner(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.content.delete_banner(id).await?;
    Ok(success_response("Banner deleted", json!({})))
}

async fn list_faqs(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let faqs = state.services.content.faqs().await?;
    Ok(success_response("OK", json!({ "faqs": faqs })))
}

async fn create_faq(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    ValidJson(input): ValidJson<FaqInput>,
) -> Result<Response, ServiceError> {
    let faq = state.services.content.create_faq(input).await?;
    Ok(created_response("FAQ created", json!({ "faq": faq })))
}

async fn update_faq(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
    ValidJson(input): ValidJson<FaqInput>,
) -> Result<Response, ServiceError> {
    let faq = state.services.content.update_faq(id, input).await?;
    Ok(success_response("FAQ updated", json!({ "faq": faq })))
}

async fn delete_faq(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.content.delete_faq(id).await?;
    Ok(success_response("FAQ deleted", json!({})))
}
