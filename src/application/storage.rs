//! Article content kept as objects in the `content` bucket.
//!
//! Each article is stored as `<slug>.md` with its descriptive fields in the
//! object's metadata. Migration copies database rows (or content files) into
//! the bucket one item at a time; a failing item is recorded and the batch
//! carries on.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};

use crate::application::client::ContentClient;
use crate::application::error::AppError;
use crate::application::fallback::{PLACEHOLDER_CONTENT, PLACEHOLDER_SLUG};
use crate::application::repos::{BlobMetadata, BlobUpload, BucketSpec};
use crate::domain::entities::{
    ArticleRecord, BatchItemResult, BlobObject, ContentFileEntry, NewArticle,
};
use crate::domain::slug::{check_slug, is_valid_slug};
use crate::domain::types::ArticleStatus;

const CONTENT_MIME_TYPES: [&str; 3] = ["text/markdown", "text/plain", "text/x-markdown"];
const MEDIA_MIME_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];
const CONTENT_SIZE_LIMIT: u64 = 5 * 1024 * 1024;
const MEDIA_SIZE_LIMIT: u64 = 10 * 1024 * 1024;
const SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Article body plus flat metadata, as kept in the content bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredContent {
    pub slug: String,
    pub content: String,
    pub metadata: BlobMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedContent {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedArticle {
    pub slug: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

pub struct StorageBridge {
    client: Arc<ContentClient>,
    content_bucket: String,
    media_bucket: String,
}

impl StorageBridge {
    pub fn new(
        client: Arc<ContentClient>,
        content_bucket: impl Into<String>,
        media_bucket: impl Into<String>,
    ) -> Self {
        Self {
            client,
            content_bucket: content_bucket.into(),
            media_bucket: media_bucket.into(),
        }
    }

    /// Project an article row onto the stored representation.
    pub fn to_storage_format(article: &ArticleRecord) -> StoredContent {
        let new_article = NewArticle::from(article);
        StoredContent {
            slug: article.slug.clone(),
            content: article.content.clone(),
            metadata: storage_metadata(&new_article),
        }
    }

    /// Rebuild the writable article fields from a stored object.
    ///
    /// Tags are split on `,` and trimmed, so tags containing a comma do not
    /// survive a round trip. Unparsable timestamps become `None`.
    pub fn from_storage_format(stored: StoredContent) -> NewArticle {
        let StoredContent {
            slug,
            content,
            metadata,
        } = stored;
        let text = |key: &str| metadata.get(key).cloned().unwrap_or_default();
        let timestamp = |key: &str| {
            metadata
                .get(key)
                .and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
        };

        let tags = metadata
            .get("tags")
            .map(|value| split_tags(value))
            .unwrap_or_default();
        let status = metadata
            .get("status")
            .and_then(|value| value.parse::<ArticleStatus>().ok())
            .unwrap_or_default();

        NewArticle {
            title: text("title"),
            slug,
            content,
            description: text("description"),
            cover_image: text("coverImage"),
            tags,
            status,
            author_name: text("author"),
            created_at: timestamp("pubDate"),
            updated_at: timestamp("updatedDate"),
        }
    }

    /// Make sure the content and media buckets exist.
    ///
    /// Returns `false` instead of failing when the remote cannot be reached.
    pub async fn init(&self) -> Result<bool, AppError> {
        let buckets = [
            BucketSpec {
                name: self.content_bucket.clone(),
                public: false,
                allowed_mime_types: CONTENT_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
                file_size_limit: CONTENT_SIZE_LIMIT,
            },
            BucketSpec {
                name: self.media_bucket.clone(),
                public: true,
                allowed_mime_types: MEDIA_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
                file_size_limit: MEDIA_SIZE_LIMIT,
            },
        ];

        for spec in &buckets {
            match self.client.ensure_bucket(spec).await {
                Ok(created) => info!(
                    target: "folio::storage",
                    bucket = %spec.name,
                    created,
                    "bucket ready"
                ),
                Err(err) if err.is_unavailable() => {
                    warn!(
                        target: "folio::storage",
                        bucket = %spec.name,
                        error = %err,
                        "storage unreachable; skipping bucket setup"
                    );
                    return Ok(false);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(true)
    }

    /// Store `<slug>.md`, replacing any previous object.
    ///
    /// The signed URL is best effort; it is omitted when signing fails.
    pub async fn upload_content(
        &self,
        slug: &str,
        content: &str,
        metadata: BlobMetadata,
    ) -> Result<UploadedContent, AppError> {
        if slug.trim().is_empty() {
            return Err(AppError::validation("slug is required"));
        }
        if !is_valid_slug(slug) {
            return Err(AppError::validation(format!(
                "slug `{slug}` cannot be used as an object name"
            )));
        }
        if content.is_empty() {
            return Err(AppError::validation("content is required"));
        }

        let path = content_path(slug);
        self.client
            .upload_blob(
                &self.content_bucket,
                &path,
                BlobUpload {
                    bytes: Bytes::copy_from_slice(content.as_bytes()),
                    content_type: "text/markdown".to_string(),
                    upsert: true,
                    metadata,
                },
            )
            .await?;

        let url = match self
            .client
            .signed_url(&self.content_bucket, &path, SIGNED_URL_TTL)
            .await
        {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(
                    target: "folio::storage",
                    path = %path,
                    error = %err,
                    "failed to sign content url"
                );
                None
            }
        };

        Ok(UploadedContent { path, url })
    }

    pub async fn get_content(&self, slug: &str) -> Result<StoredContent, AppError> {
        check_slug(slug)?;
        let path = content_path(slug);
        let bytes = match self.client.download_blob(&self.content_bucket, &path).await {
            Ok(bytes) => bytes,
            Err(err) if slug == PLACEHOLDER_SLUG => {
                warn!(
                    target: "folio::storage",
                    error = %err,
                    "serving placeholder content"
                );
                return Ok(StoredContent {
                    slug: slug.to_string(),
                    content: PLACEHOLDER_CONTENT.to_string(),
                    metadata: BlobMetadata::from([("title".to_string(), "Placeholder".to_string())]),
                });
            }
            Err(err) => return Err(err),
        };

        let metadata = match self.client.blob_metadata(&self.content_bucket, &path).await {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    target: "folio::storage",
                    path = %path,
                    error = %err,
                    "object metadata unavailable"
                );
                BlobMetadata::new()
            }
        };

        Ok(StoredContent {
            slug: slug.to_string(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
            metadata,
        })
    }

    pub async fn delete_content(&self, slug: &str) -> Result<(), AppError> {
        check_slug(slug)?;
        self.client
            .delete_blobs(&self.content_bucket, &[content_path(slug)])
            .await
    }

    pub async fn list_content(&self) -> Result<Vec<BlobObject>, AppError> {
        self.client.list_blobs(&self.content_bucket, "").await
    }

    /// Upload each article; one result per article, in input order.
    pub async fn migrate(&self, articles: &[ArticleRecord]) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(articles.len());
        for article in articles {
            let stored = Self::to_storage_format(article);
            results.push(self.migrate_item(stored).await);
        }
        log_batch("migrate", &results);
        results
    }

    /// Migrate every database article. Only the initial listing can fail.
    pub async fn migrate_all(&self) -> Result<Vec<BatchItemResult>, AppError> {
        let articles = self.client.list_articles_strict().await?;
        Ok(self.migrate(&articles).await)
    }

    pub async fn migrate_one(&self, id_or_slug: &str) -> Result<MigratedArticle, AppError> {
        let article = self.client.get_article_strict(id_or_slug).await?;
        let stored = Self::to_storage_format(&article);
        let uploaded = self
            .upload_content(&stored.slug, &stored.content, stored.metadata)
            .await?;
        Ok(MigratedArticle {
            slug: article.slug,
            path: uploaded.path,
            url: uploaded.url,
        })
    }

    /// Upload content files directly, bypassing the database.
    pub async fn migrate_files(
        &self,
        entries: &[ContentFileEntry],
        now: OffsetDateTime,
    ) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            let article = entry.to_new_article(now);
            let stored = StoredContent {
                slug: article.slug.clone(),
                content: article.content.clone(),
                metadata: storage_metadata(&article),
            };
            results.push(self.migrate_item(stored).await);
        }
        log_batch("migrate_files", &results);
        results
    }

    async fn migrate_item(&self, stored: StoredContent) -> BatchItemResult {
        match self
            .upload_content(&stored.slug, &stored.content, stored.metadata)
            .await
        {
            Ok(uploaded) => {
                BatchItemResult::success(&stored.slug, "Migrated successfully")
                    .with_path(uploaded.path)
            }
            Err(err) => {
                warn!(
                    target: "folio::storage",
                    slug = %stored.slug,
                    error = %err,
                    "migration item failed"
                );
                BatchItemResult::error(&stored.slug, err.to_string())
            }
        }
    }
}

fn content_path(slug: &str) -> String {
    format!("{slug}.md")
}

fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn storage_metadata(article: &NewArticle) -> BlobMetadata {
    let mut metadata = BlobMetadata::new();
    metadata.insert("title".into(), article.title.clone());
    metadata.insert("description".into(), article.description.clone());
    if let Some(created_at) = article.created_at.and_then(format_timestamp) {
        metadata.insert("pubDate".into(), created_at);
    }
    if let Some(updated_at) = article.updated_at.and_then(format_timestamp) {
        metadata.insert("updatedDate".into(), updated_at);
    }
    metadata.insert("coverImage".into(), article.cover_image.clone());
    metadata.insert("author".into(), article.author_name.clone());
    metadata.insert("tags".into(), article.tags.join(","));
    metadata.insert("status".into(), article.status.as_str().to_string());
    metadata
}

fn format_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    timestamp.format(&Rfc3339).ok()
}

fn log_batch(op: &'static str, results: &[BatchItemResult]) {
    let summary = crate::domain::entities::BatchSummary::from_results(results);
    info!(
        target: "folio::storage",
        op,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "storage batch finished"
    );
}
