mod handlers;
mod middleware;
pub mod models;
pub mod state;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use state::HttpState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};

use crate::config::UploadSettings;

use self::middleware::{log_responses, set_request_context};

pub fn build_router(state: HttpState, uploads: &UploadSettings) -> Router {
    let body_limit = usize::try_from(uploads.max_request_bytes.get()).unwrap_or(usize::MAX);

    Router::new()
        .route("/api/content/import", post(handlers::import_all_content))
        .route("/api/content/import/{slug}", post(handlers::import_content))
        .route("/api/content/export", post(handlers::export_all_content))
        .route("/api/content/export/{slug}", post(handlers::export_content))
        .route("/api/content/sync", post(handlers::sync_content))
        .route("/api/content/mapping", get(handlers::content_mapping))
        .route("/api/storage/list", get(handlers::list_storage))
        .route(
            "/api/storage/content/{slug}",
            get(handlers::get_storage_content).delete(handlers::delete_storage_content),
        )
        .route("/api/storage/migrate-all", post(handlers::migrate_all_storage))
        .route("/api/storage/migrate/{slug}", post(handlers::migrate_storage_item))
        .route("/api/storage/upload", post(handlers::upload_storage_content))
        .route("/api/storage/init", post(handlers::init_storage))
        .route(
            "/api/media/list",
            get(handlers::list_media).post(handlers::list_media),
        )
        .route("/api/media/upload", post(handlers::upload_media))
        .route("/api/media/delete/{*path}", delete(handlers::delete_media))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
