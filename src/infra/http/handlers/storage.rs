//! Content bucket routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use crate::application::error::AppError;
use crate::infra::http::models::{
    BatchResponse, ItemResponse, MessageResponse, MigrateOneResponse, StorageListResponse,
    StorageUploadRequest,
};
use crate::infra::http::state::HttpState;

use super::bad_request;

const SOURCE: &str = "infra::http::handlers::storage";

pub async fn list_storage(State(state): State<HttpState>) -> Result<impl IntoResponse, AppError> {
    let items = state.storage.list_content().await?;
    Ok(Json(StorageListResponse { items }))
}

pub async fn get_storage_content(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let content = state.storage.get_content(&slug).await?;
    Ok(Json(content))
}

pub async fn delete_storage_content(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.storage.delete_content(&slug).await?;
    Ok(Json(MessageResponse::new(format!(
        "Content \"{slug}\" deleted successfully"
    ))))
}

pub async fn migrate_all_storage(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, AppError> {
    let results = state.storage.migrate_all().await?;
    Ok(Json(BatchResponse {
        message: "Content migration completed".to_string(),
        results,
    }))
}

pub async fn migrate_storage_item(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.storage.migrate_one(&slug).await?;
    Ok(Json(MigrateOneResponse {
        message: format!("Article \"{slug}\" migrated successfully from database"),
        result,
        source: "database",
    }))
}

pub async fn upload_storage_content(
    State(state): State<HttpState>,
    Json(payload): Json<StorageUploadRequest>,
) -> Result<Response, AppError> {
    if payload.slug.trim().is_empty() || payload.content.is_empty() {
        return Ok(bad_request(SOURCE, "Slug and content are required"));
    }

    let result = state
        .storage
        .upload_content(&payload.slug, &payload.content, payload.metadata)
        .await?;
    Ok(Json(ItemResponse::new("Content uploaded successfully", result)).into_response())
}

pub async fn init_storage(State(state): State<HttpState>) -> Result<impl IntoResponse, AppError> {
    let result = state.storage.init().await?;
    Ok(Json(ItemResponse::new(
        "Storage initialized successfully",
        result,
    )))
}
