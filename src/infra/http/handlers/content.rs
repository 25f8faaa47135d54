//! Content directory ⇄ database routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::application::error::AppError;
use crate::infra::http::models::{BatchResponse, ItemResponse, MappingResponse};
use crate::infra::http::state::HttpState;

pub async fn import_all_content(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, AppError> {
    let results = state.content.import_all().await?;
    Ok(Json(BatchResponse {
        message: "Content files imported successfully".to_string(),
        results,
    }))
}

pub async fn import_content(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.content.import(&slug).await?;
    Ok(Json(ItemResponse::new(
        format!("Article \"{slug}\" imported successfully"),
        result,
    )))
}

pub async fn export_all_content(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, AppError> {
    let results = state.content.export_all().await?;
    Ok(Json(BatchResponse {
        message: "Database exported to content files successfully".to_string(),
        results,
    }))
}

pub async fn export_content(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.content.export(&slug).await?;
    Ok(Json(ItemResponse::new(
        format!("Article \"{slug}\" exported successfully"),
        result,
    )))
}

pub async fn sync_content(State(state): State<HttpState>) -> Result<impl IntoResponse, AppError> {
    let result = state.content.sync().await?;
    Ok(Json(ItemResponse::new(
        "Content files synced to database successfully",
        result,
    )))
}

pub async fn content_mapping(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, AppError> {
    let articles = state.content.all_articles().await?;
    Ok(Json(MappingResponse { articles }))
}
