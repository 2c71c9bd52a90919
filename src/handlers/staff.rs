use crate::{
    auth::{OptionalAuthUser, StaffUser},
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::staff::{AdminInput, StaffLoginInput, SubAdminInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, post},
    Router,
};
use serde_json::json;

/// Creates the router for admin and sub-admin endpoints
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", post(create_admin))
        .route("/admin/login", post(admin_login))
        .route("/subAdmin", post(create_sub_admin).get(list_sub_admins))
        .route("/subAdmin/login", post(sub_admin_login))
        .route("/subAdmin/:id", delete(delete_sub_admin))
}

async fn create_admin(
    State(state): State<AppState>,
    OptionalAuthUser(caller): OptionalAuthUser,
    ValidJson(input): ValidJson<AdminInput>,
) -> Result<Response, ServiceError> {
    let admin = state.services.staff.create_admin(caller.as_ref(), input).await?;
    Ok(created_response("Success", json!({ "admin": admin })))
}

async fn admin_login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<StaffLoginInput>,
) -> Result<Response, ServiceError> {
    let session = state.services.staff.admin_login(input).await?;
    Ok(success_response("Success", session))
}

async fn create_sub_admin(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    ValidJson(input): ValidJson<SubAdminInput>,
) -> Result<Response, ServiceError> {
    let admin = state.services.staff.create_sub_admin(input).await?;
    Ok(created_response(
        "Sub-admin created successfully",
        json!({ "admin": admin }),
    ))
}

async fn list_sub_admins(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
) -> Result<Response, ServiceError> {
    let sub_admins = state.services.staff.list_sub_admins().await?;
    Ok(success_response("OK", json!({ "subAdmins": sub_admins })))
}

async fn sub_admin_login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<StaffLoginInput>,
) -> Result<Response, ServiceError> {
    let session = state.services.staff.sub_admin_login(input).await?;
    Ok(success_response("Success", session))
}

async fn delete_sub_admin(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.staff.delete_sub_admin(id).await?;
    Ok(success_response("Sub-admin deleted successfully", json!({})))
}
