use crate::{errors::ServiceError, handlers::common::success_response, AppState};
use axum::{extract::State, response::Response, routing::get, Router};
use serde_json::json;

pub fn notifications_routes() -> Router<AppState> {
    Router::new().route("/notifications", get(list_notifications))
}

async fn list_notifications(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let notifications = state.services.notifications.latest().await?;
    Ok(success_response("OK", json!({ "notifications": notifications })))
}
