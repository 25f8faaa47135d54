//! Traits describing the remote article store, object storage and the
//! local content directory.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::entities::{
    ArticleRecord, ArticleUpdate, BlobObject, ContentFileEntry, NewArticle,
};
use crate::domain::types::ContentFormat;

/// Flat string metadata stored alongside an object.
pub type BlobMetadata = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("resource not found")]
    NotFound,
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    /// All articles, newest first.
    async fn list_articles(&self) -> Result<Vec<ArticleRecord>, RepoError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ArticleRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>, RepoError>;

    async fn create_article(&self, article: &NewArticle) -> Result<ArticleRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when no row has `id`.
    async fn update_article(
        &self,
        id: &str,
        update: &ArticleUpdate,
    ) -> Result<ArticleRecord, RepoError>;

    async fn delete_article(&self, id: &str) -> Result<(), RepoError>;
}

/// Bucket definition used when provisioning storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    pub name: String,
    pub public: bool,
    pub allowed_mime_types: Vec<String>,
    pub file_size_limit: u64,
}

#[derive(Debug, Clone)]
pub struct BlobUpload {
    pub bytes: Bytes,
    pub content_type: String,
    pub upsert: bool,
    pub metadata: BlobMetadata,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the bucket unless it exists. Returns `true` when it was created.
    async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<bool, RepoError>;

    async fn upload(&self, bucket: &str, path: &str, upload: BlobUpload)
    -> Result<(), RepoError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, RepoError>;

    async fn metadata(&self, bucket: &str, path: &str) -> Result<BlobMetadata, RepoError>;

    /// Objects directly under `prefix` (empty for the bucket root).
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>, RepoError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), RepoError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, RepoError>;
}

/// Markdown files keyed by slug.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Every readable entry, ordered by file name. Unparsable files are skipped.
    async fn list_entries(&self) -> Result<Vec<ContentFileEntry>, RepoError>;

    async fn find_entry(&self, slug: &str) -> Result<Option<ContentFileEntry>, RepoError>;

    /// Write `<slug>.<ext>` and return its path.
    async fn write_entry(
        &self,
        slug: &str,
        format: ContentFormat,
        document: &str,
    ) -> Result<String, RepoError>;
}
