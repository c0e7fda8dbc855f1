use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::journal::ReconcileReport;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub photos: usize,
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub files_deleted: u64,
    pub photos_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health(State(state): State<Arc<AppState>>) -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        photos: state.journal.get_photos().await.len(),
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn admin_reconcile(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<ReconcileReport>>, ApiError> {
    let report = state.journal.reconcile().await?;
    Ok(JSend::success(report))
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state.journal.purge().await?;

    tracing::warn!(
        photos = stats.photos,
        files = stats.files,
        "Purged all photos"
    );

    Ok(JSend::success(PurgeResponse {
        files_deleted: stats.files,
        photos_deleted: stats.photos,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::ImageSource;
    use crate::testutil::test_state;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_health_counts_photos() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        state
            .journal
            .add_photo(ImageSource::Bytes(Bytes::from("a")), "A")
            .await
            .unwrap();

        let Json(body) = health(State(state)).await;
        assert_eq!(body.data.photos, 1);
        assert_eq!(body.data.status, "ok");
    }

    #[tokio::test]
    async fn test_admin_purge_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        for title in ["A", "B"] {
            state
                .journal
                .add_photo(ImageSource::Bytes(Bytes::from("img")), title)
                .await
                .unwrap();
        }

        let Json(body) = admin_purge(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(body.data.photos_deleted, 2);
        assert_eq!(body.data.files_deleted, 2);
        assert!(state.journal.get_photos().await.is_empty());
    }

    #[tokio::test]
    async fn test_admin_purge_reports_only_journal_counts() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        state
            .journal
            .add_photo(ImageSource::Bytes(Bytes::from("img")), "A")
            .await
            .unwrap();

        let Json(body) = admin_purge(State(Arc::clone(&state))).await.unwrap();
        let json = serde_json::to_value(&body.data).unwrap();
        assert_eq!(json["photos_deleted"], 1);
        assert_eq!(json["files_deleted"], 1);
        assert!(json.get("preferences_deleted").is_none());

        // A second purge on an empty journal still succeeds
        let Json(body) = admin_purge(State(state)).await.unwrap();
        assert_eq!(body.data.photos_deleted, 0);
        assert_eq!(body.data.files_deleted, 0);
    }
}
