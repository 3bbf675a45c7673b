//! Image upload endpoint (/api/upload-to-gcp)

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    routing::post,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::AppState;
use crate::constants::UPLOAD_ROUTE;
use crate::services::error::ApiError;
use crate::services::upload::{self, UploadResponse};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(UPLOAD_ROUTE, post(upload_to_gcp))
}

/// POST /api/upload-to-gcp - Store one image under a caller-chosen key
/// Accepts multipart form data with:
/// - "file": the image bytes, content-type image/*, at most 5 MB
/// - "filename": the object key, used verbatim
async fn upload_to_gcp(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    // Not a multipart body at all: there is no file to find.
    let multipart = multipart.map_err(|rejection| {
        warn!("[upload] Not a multipart request: {}", rejection.body_text());
        ApiError::MissingField
    })?;

    let upload = upload::read_upload_form(multipart).await.map_err(|e| {
        warn!("[upload] Rejected: {}", e);
        e
    })?;

    info!(
        "[upload] {} ({}, {} bytes)",
        upload.object_name(),
        upload.content_type(),
        upload.size()
    );

    let response = upload::upload_image(state.store.as_ref(), upload).await?;
    Ok(Json(response))
}
