//! Images and other assets in the public media bucket.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::application::client::ContentClient;
use crate::application::error::AppError;
use crate::application::fallback;
use crate::application::repos::{BlobMetadata, BlobUpload};
use crate::domain::entities::MediaObject;
use crate::domain::slug::safe_media_file_name;

// Storage creates this marker object for empty folders.
const FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

#[derive(Debug, Clone, Default)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub folder: Option<String>,
    pub alt_text: Option<String>,
}

pub struct MediaService {
    client: Arc<ContentClient>,
    bucket: String,
}

impl MediaService {
    pub fn new(client: Arc<ContentClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Store an asset under a sanitised name and return its public URL.
    pub async fn upload(&self, upload: MediaUpload) -> Result<MediaObject, AppError> {
        if upload.bytes.is_empty() {
            return Err(AppError::validation("uploaded file is empty"));
        }

        let name = safe_media_file_name(&upload.file_name);
        let path = join_path(upload.folder.as_deref(), &name);
        let content_type = upload
            .content_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

        let mut metadata = BlobMetadata::new();
        if let Some(alt_text) = upload.alt_text.filter(|text| !text.trim().is_empty()) {
            metadata.insert("altText".to_string(), alt_text);
        }

        self.client
            .upload_blob(
                &self.bucket,
                &path,
                BlobUpload {
                    bytes: upload.bytes,
                    content_type,
                    upsert: false,
                    metadata,
                },
            )
            .await?;

        info!(target: "folio::media", path = %path, "media uploaded");
        Ok(MediaObject {
            url: self.client.public_url(&self.bucket, &path),
            name,
            path,
            id: None,
            created_at: None,
        })
    }

    /// Assets directly under `folder`; sample assets while storage is unreachable.
    pub async fn list(&self, folder: Option<&str>) -> Result<Vec<MediaObject>, AppError> {
        let prefix = folder.map(normalize_folder).unwrap_or_default();
        let objects = self
            .client
            .list_blobs_or(&self.bucket, &prefix, fallback::sample_media)
            .await?;

        Ok(objects
            .into_iter()
            .filter(|object| object.name != FOLDER_PLACEHOLDER)
            .map(|object| {
                let path = join_path(Some(prefix.as_str()), &object.name);
                MediaObject {
                    url: self.client.public_url(&self.bucket, &path),
                    name: object.name,
                    path,
                    id: object.id,
                    created_at: object.created_at,
                }
            })
            .collect())
    }

    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(AppError::validation("media path is required"));
        }
        self.client
            .delete_blobs(&self.bucket, &[path.to_string()])
            .await?;
        info!(target: "folio::media", path, "media deleted");
        Ok(())
    }
}

fn normalize_folder(folder: &str) -> String {
    folder
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

fn join_path(folder: Option<&str>, name: &str) -> String {
    match folder.map(normalize_folder) {
        Some(folder) if !folder.is_empty() => format!("{folder}/{name}"),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_are_normalized_into_paths() {
        assert_eq!(join_path(None, "a.png"), "a.png");
        assert_eq!(join_path(Some(""), "a.png"), "a.png");
        assert_eq!(join_path(Some("/posts/2024/"), "a.png"), "posts/2024/a.png");
        assert_eq!(join_path(Some("../etc"), "a.png"), "etc/a.png");
    }
}
