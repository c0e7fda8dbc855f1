use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Leave room for the multipart framing and the title field
    let upload_limit = state.config.max_upload_size as usize + 64 * 1024;

    let mut router = Router::new()
        // Photos
        .route("/photos", get(handlers::list_photos))
        .route(
            "/photos",
            post(handlers::create_photo).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/photos/:id", delete(handlers::delete_photo))
        .route("/photos/:id", get(handlers::get_photo))
        .route("/photos/:id", put(handlers::update_photo))
        // Image content
        .route("/photos/:id/image", get(handlers::serve_image))
        .route("/photos/:id/data-url", get(handlers::image_data_url))
        // Maintenance
        .route("/admin/reconcile", post(handlers::admin_reconcile))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
