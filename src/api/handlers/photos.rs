use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::journal::{ImageSource, JournalError, PhotoRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub file_path: String,
    pub id: String,
    pub timestamp: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdatePhotoRequest {
    pub title: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_photo(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<PhotoResponse>>, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut source_handle: Option<String> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart data", e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file", e))?;

                if data.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {} bytes",
                        state.config.max_upload_size
                    )));
                }
                file_data = Some(data);
            }
            "source" => {
                source_handle = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid source: {e}")))?,
                );
            }
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid title: {e}")))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let title = title.ok_or_else(|| ApiError::bad_request("title field is required"))?;
    let title = check_title(&title, state.config.journal.max_title_length)?;
    if title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let source = match (file_data, source_handle) {
        (Some(data), _) => ImageSource::Bytes(data),
        (None, Some(handle)) if !handle.trim().is_empty() => state
            .config
            .journal
            .source_policy()
            .admit(ImageSource::parse(&handle))
            .await
            .map_err(JournalError::from)?,
        _ => return Err(ApiError::bad_request("file or source field is required")),
    };

    let record = state.journal.add_photo(source, title).await?;

    tracing::debug!(photo_id = %record.id, "Created photo");
    Ok(JSend::success(photo_to_response(&record)))
}

pub async fn list_photos(State(state): State<Arc<AppState>>) -> Json<JSend<Vec<PhotoResponse>>> {
    let photos = state.journal.get_photos().await;
    JSend::success(photos.iter().map(photo_to_response).collect())
}

pub async fn get_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<PhotoResponse>>, ApiError> {
    let record = state.journal.get_photo(&id).await?;
    Ok(JSend::success(photo_to_response(&record)))
}

pub async fn update_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdatePhotoRequest>,
) -> Result<Json<JSend<PhotoResponse>>, ApiError> {
    let title = check_title(&req.title, state.config.journal.max_title_length)?;
    if title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let record = state.journal.update_photo_title(&id, title).await?;

    tracing::debug!(photo_id = %id, "Updated photo");
    Ok(JSend::success(photo_to_response(&record)))
}

pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<DeleteResponse>>, ApiError> {
    let deleted = state.journal.delete_photo(&id).await?;

    tracing::debug!(photo_id = %id, "Deleted photo");
    Ok(JSend::success(DeleteResponse { deleted }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Body-limit overruns surface from the multipart stream; keep them as 413.
fn multipart_error(context: &str, e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(format!("{context}: {}", e.body_text()))
    } else {
        ApiError::bad_request(format!("{context}: {}", e.body_text()))
    }
}

/// Trim a title and enforce the length limit (counted in characters).
fn check_title(title: &str, max_length: usize) -> Result<&str, ApiError> {
    let title = title.trim();
    if title.chars().count() > max_length {
        return Err(ApiError::bad_request(format!(
            "title must be at most {max_length} characters"
        )));
    }
    Ok(title)
}

fn photo_to_response(record: &PhotoRecord) -> PhotoResponse {
    PhotoResponse {
        file_path: record.file_path.clone(),
        id: record.id.clone(),
        timestamp: record.timestamp.clone(),
        title: record.title.clone(),
        web_path: record.web_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;

    async fn seed(state: &Arc<AppState>, title: &str) -> PhotoRecord {
        state
            .journal
            .add_photo(ImageSource::Bytes(Bytes::from("jpeg")), title)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_photos_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let Json(body) = list_photos(State(state)).await;
        assert!(body.data.is_empty());
    }

    #[tokio::test]
    async fn test_get_photo_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let err = get_photo(State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_photo_trims_title() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let record = seed(&state, "Sunset").await;

        let Json(body) = update_photo(
            State(Arc::clone(&state)),
            Path(record.id.clone()),
            AppJson(UpdatePhotoRequest {
                title: "  Lake  ".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.data.title, "Lake");
        assert_eq!(body.data.file_path, record.file_path);
    }

    #[tokio::test]
    async fn test_update_photo_rejects_blank_title() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let record = seed(&state, "Sunset").await;

        let err = update_photo(
            State(Arc::clone(&state)),
            Path(record.id.clone()),
            AppJson(UpdatePhotoRequest {
                title: "   ".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(state.journal.get_photo(&record.id).await.unwrap().title, "Sunset");
    }

    #[tokio::test]
    async fn test_update_photo_rejects_long_title() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let record = seed(&state, "Sunset").await;

        let err = update_photo(
            State(Arc::clone(&state)),
            Path(record.id),
            AppJson(UpdatePhotoRequest {
                title: "x".repeat(101),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_photo_then_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let record = seed(&state, "Sunset").await;

        let Json(body) = delete_photo(State(Arc::clone(&state)), Path(record.id.clone()))
            .await
            .unwrap();
        assert!(body.data.deleted);

        let err = delete_photo(State(state), Path(record.id))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_check_title_counts_characters() {
        let title = "é".repeat(100);
        assert!(check_title(&title, 100).is_ok());
        assert_eq!(check_title("  Sunset ", 100).unwrap(), "Sunset");
    }
}
