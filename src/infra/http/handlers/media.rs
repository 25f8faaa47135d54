//! Media bucket routes.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Response};

use crate::application::error::AppError;
use crate::application::media::MediaUpload;
use crate::infra::http::models::{
    MediaListQuery, MediaListResponse, MediaUploadResponse, MessageResponse,
};
use crate::infra::http::state::HttpState;

use super::bad_request;

const SOURCE: &str = "infra::http::handlers::media";

pub async fn list_media(
    State(state): State<HttpState>,
    Query(query): Query<MediaListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let folder = query.folder.as_deref().filter(|folder| !folder.is_empty());
    let media = state.media.list(folder).await?;
    Ok(Json(MediaListResponse { media }))
}

pub async fn upload_media(
    State(state): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload = MediaUpload::default();
    let mut has_file = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Ok(err.into_response()),
        };

        match field.name() {
            Some("file") => {
                upload.file_name = field.file_name().unwrap_or_default().to_string();
                upload.content_type = field.content_type().map(str::to_string);
                upload.bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => return Ok(err.into_response()),
                };
                has_file = true;
            }
            Some("folder") => upload.folder = text_field(field).await,
            Some("alt-text") => upload.alt_text = text_field(field).await,
            _ => {}
        }
    }

    if !has_file || upload.file_name.is_empty() {
        return Ok(bad_request(SOURCE, "No file provided"));
    }

    let file = state.media.upload(upload).await?;
    Ok(Json(MediaUploadResponse {
        message: "File uploaded successfully".to_string(),
        file,
    })
    .into_response())
}

pub async fn delete_media(
    State(state): State<HttpState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.media.delete(&path).await?;
    Ok(Json(MessageResponse::new("Media deleted successfully")))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Option<String> {
    field
        .text()
        .await
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
