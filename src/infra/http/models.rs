use serde::{Deserialize, Serialize};

use crate::application::repos::BlobMetadata;
use crate::domain::entities::{BatchItemResult, BlobObject, ContentMappingEntry, MediaObject};

/// Body of a successful call that returns nothing but a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a batch call: one entry per processed item.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub message: String,
    pub results: Vec<BatchItemResult>,
}

/// Body of a single-item call.
#[derive(Debug, Serialize)]
pub struct ItemResponse<T> {
    pub message: String,
    pub result: T,
}

impl<T> ItemResponse<T> {
    pub fn new(message: impl Into<String>, result: T) -> Self {
        Self {
            message: message.into(),
            result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MigrateOneResponse<T> {
    pub message: String,
    pub result: T,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MappingResponse {
    pub articles: Vec<ContentMappingEntry>,
}

#[derive(Debug, Serialize)]
pub struct StorageListResponse {
    pub items: Vec<BlobObject>,
}

#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub media: Vec<MediaObject>,
}

#[derive(Debug, Serialize)]
pub struct MediaUploadResponse {
    pub message: String,
    pub file: MediaObject,
}

#[derive(Debug, Deserialize)]
pub struct StorageUploadRequest {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: BlobMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaListQuery {
    pub folder: Option<String>,
}
