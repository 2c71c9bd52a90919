use crate::{
    auth::{AuthUser, StaffUser},
    errors::ServiceError,
    handlers::common::{created_response, success_response, PaginationParams, ValidJson},
    services::accounts::{ChangePasswordInput, LoginInput, SignupInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

/// Creates the router for reader account endpoints
pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/user/forgot", get(forgot_password))
        .route("/user/changePassword", post(change_password))
        .route("/users/all", get(list_users))
        .route("/user/id/:id", get(get_user))
        .route("/delete/:id", delete(deactivate_user))
}

#[derive(Debug, Deserialize)]
pub struct ForgotQuery {
    pub query: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SignupInput>,
) -> Result<Response, ServiceError> {
    let session = state.services.accounts.signup(input).await?;
    Ok(created_response("User registered successfully", session))
}

async fn login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<LoginInput>,
) -> Result<Response, ServiceError> {
    let session = state.services.accounts.login(input).await?;
    Ok(success_response("Login successful", session))
}

async fn profile(State(state): State<AppState>, user: AuthUser) -> Result<Response, ServiceError> {
    let user = state.services.accounts.profile(user.id).await?;
    Ok(success_response(
        "Profile retrieved successfully",
        json!({ "user": user }),
    ))
}

async fn forgot_password(
    State(state): State<AppState>,
    Query(params): Query<ForgotQuery>,
) -> Result<Response, ServiceError> {
    let query = params.query.unwrap_or_default();
    let ticket = state.services.accounts.forgot_password(&query).await?;
    Ok(success_response("OK", ticket))
}

async fn change_password(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<ChangePasswordInput>,
) -> Result<Response, ServiceError> {
    state.services.accounts.change_password(input).await?;
    Ok(success_response("Password Changed", json!({})))
}

async fn list_users(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let page = state.services.accounts.list(params.page, params.limit).await?;
    Ok(success_response("OK", page))
}

async fn get_user(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let user = state.services.accounts.profile(id).await?;
    let history = state.services.subscriptions.history(id).await?;
    Ok(success_response(
        "OK",
        json!({ "user": user, "subscriptionHistory": history }),
    ))
}

async fn deactivate_user(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.accounts.deactivate(id).await?;
    Ok(created_response("Success", json!({})))
}
