use crate::{
    auth::StaffUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response, ValidJson},
    services::commerce::plan_service::PlanInput,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

/// Creates the router for subscription plan endpoints
pub fn plans_routes() -> Router<AppState> {
    Router::new()
        .route("/plan", get(list_plans).post(create_plan))
        .route("/plans", get(list_plans))
        .route(
            "/plan/:id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
}

async fn list_plans(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let plans = state.services.plans.list().await?;
    Ok(success_response("OK", json!({ "plans": plans })))
}

async fn get_plan(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Response, ServiceError> {
    let plan = state.services.plans.get(id).await?;
    Ok(success_response("OK", json!({ "plan": plan })))
}

async fn create_plan(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    ValidJson(input): ValidJson<PlanInput>,
) -> Result<Response, ServiceError> {
    let plan = state.services.plans.create(input).await?;
    Ok(created_response("Plan created successfully", json!({ "plan": plan })))
}

async fn update_plan(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
    ValidJson(input): ValidJson<PlanInput>,
) -> Result<Response, ServiceError> {
    let plan = state.services.plans.update(id, input).await?;
    Ok(success_response("Plan updated successfully", json!({ "plan": plan })))
}

async fn delete_plan(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.plans.delete(id).await?;
    Ok(success_response("Plan deleted successfully", json!({})))
}
