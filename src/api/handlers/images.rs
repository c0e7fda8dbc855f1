use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DataUrlResponse {
    pub data_url: String,
}

/// Serve the raw image bytes of a photo.
/// Route: GET /photos/:id/image
pub async fn serve_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.journal.get_photo(&id).await?;

    // Unreadable bytes are a display problem, not a server failure
    let data = state
        .journal
        .read_photo_bytes(&record.file_path)
        .await
        .ok_or_else(|| ApiError::not_found("Photo content not available"))?;

    let byte_size = data.len() as u64;
    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    let mime_type = mime_guess::from_path(&record.file_path)
        .first_or_octet_stream()
        .to_string();
    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(byte_size));

    let filename = record
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or(&record.file_path);
    if let Ok(value) = format!("inline; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Bytes never change once written; only the title does
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("private, max-age=3600"),
    );

    Ok(response)
}

/// Photo bytes as an inline `data:` URL.
/// Route: GET /photos/:id/data-url
pub async fn image_data_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<DataUrlResponse>>, ApiError> {
    let record = state.journal.get_photo(&id).await?;
    let data_url = state
        .journal
        .read_photo_data_url(&record.file_path)
        .await
        .ok_or_else(|| ApiError::not_found("Photo content not available"))?;

    Ok(JSend::success(DataUrlResponse { data_url }))
}
