use crate::{
    auth::StaffUser,
    errors::ServiceError,
    handlers::common::created_response,
    AppState,
};
use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Router,
};
use serde_json::json;
use tracing::instrument;

/// Multipart field that carries the file
const FILE_FIELD: &str = "file";

pub fn uploads_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_file))
}

#[instrument(skip_all)]
async fn upload_file(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
        if bytes.is_empty() {
            return Err(ServiceError::invalid_field(FILE_FIELD, "File is empty"));
        }

        let name = state.services.storage.save(&original, &bytes).await?;
        let url = format!("{}/uploads/{}", state.config.public_base_url(), name);
        return Ok(created_response(
            "File uploaded successfully",
            json!({ "fileUrl": url, "fileName": name }),
        ));
    }
    Err(ServiceError::invalid_field(FILE_FIELD, "No file uploaded"))
}
