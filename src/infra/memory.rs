//! In-process backends used when no remote project is configured, and by tests.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::fallback;
use crate::application::repos::{
    ArticlesRepo, BlobMetadata, BlobStore, BlobUpload, BucketSpec, RepoError,
};
use crate::domain::entities::{ArticleRecord, ArticleUpdate, BlobObject, NewArticle};

/// Article table kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryArticles {
    rows: RwLock<Vec<ArticleRecord>>,
}

impl InMemoryArticles {
    /// Table pre-filled with the sample articles.
    pub fn seeded() -> Self {
        Self::with_rows(fallback::sample_articles())
    }

    pub fn with_rows(rows: Vec<ArticleRecord>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl ArticlesRepo for InMemoryArticles {
    async fn list_articles(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArticleRecord>, RepoError> {
        Ok(self.rows.read().await.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>, RepoError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|a| a.slug == slug)
            .cloned())
    }

    async fn create_article(&self, article: &NewArticle) -> Result<ArticleRecord, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.slug == article.slug) {
            return Err(RepoError::rejected(
                409,
                format!("duplicate key value violates unique constraint on slug `{}`", article.slug),
            ));
        }

        let now = OffsetDateTime::now_utc();
        let record = ArticleRecord {
            id: Uuid::new_v4().to_string(),
            title: article.title.clone(),
            slug: article.slug.clone(),
            content: article.content.clone(),
            description: article.description.clone(),
            cover_image: article.cover_image.clone(),
            tags: article.tags.clone(),
            status: article.status,
            author_name: article.author_name.clone(),
            created_at: article.created_at.unwrap_or(now),
            updated_at: article.updated_at.unwrap_or(now),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn update_article(
        &self,
        id: &str,
        update: &ArticleUpdate,
    ) -> Result<ArticleRecord, RepoError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        update.apply_to(row);
        if update.updated_at.is_none() {
            row.updated_at = OffsetDateTime::now_utc();
        }
        Ok(row.clone())
    }

    async fn delete_article(&self, id: &str) -> Result<(), RepoError> {
        self.rows.write().await.retain(|row| row.id != id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    id: String,
    bytes: Bytes,
    metadata: BlobMetadata,
    created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct Bucket {
    objects: BTreeMap<String, StoredObject>,
}

/// Object storage kept in memory. Buckets are created on first upload.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    buckets: RwLock<HashMap<String, Bucket>>,
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<bool, RepoError> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(&spec.name) {
            return Ok(false);
        }
        buckets.insert(spec.name.clone(), Bucket::default());
        Ok(true)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        upload: BlobUpload,
    ) -> Result<(), RepoError> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets.entry(bucket.to_string()).or_default();
        if !upload.upsert && bucket.objects.contains_key(path) {
            return Err(RepoError::rejected(409, format!("object `{path}` already exists")));
        }
        bucket.objects.insert(
            path.to_string(),
            StoredObject {
                id: Uuid::new_v4().to_string(),
                bytes: upload.bytes,
                metadata: upload.metadata,
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, RepoError> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|b| b.objects.get(path))
            .map(|object| object.bytes.clone())
            .ok_or(RepoError::NotFound)
    }

    async fn metadata(&self, bucket: &str, path: &str) -> Result<BlobMetadata, RepoError> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|b| b.objects.get(path))
            .map(|object| object.metadata.clone())
            .ok_or(RepoError::NotFound)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>, RepoError> {
        let buckets = self.buckets.read().await;
        let Some(bucket) = buckets.get(bucket) else {
            return Ok(Vec::new());
        };

        let prefix = prefix.trim_matches('/');
        let objects = bucket
            .objects
            .iter()
            .filter_map(|(path, object)| {
                let name = if prefix.is_empty() {
                    path.as_str()
                } else {
                    path.strip_prefix(prefix)?.strip_prefix('/')?
                };
                // Direct children only.
                (!name.contains('/')).then(|| BlobObject {
                    name: name.to_string(),
                    id: Some(object.id.clone()),
                    created_at: object
                        .created_at
                        .format(&time::format_description::well_known::Rfc3339)
                        .ok(),
                    updated_at: None,
                    metadata: Some(serde_json::json!({ "size": object.bytes.len() })),
                })
            })
            .collect();
        Ok(objects)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), RepoError> {
        if let Some(bucket) = self.buckets.write().await.get_mut(bucket) {
            for path in paths {
                bucket.objects.remove(path);
            }
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("/storage/{bucket}/{path}")
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, RepoError> {
        if self.download(bucket, path).await.is_err() {
            return Err(RepoError::NotFound);
        }
        Ok(format!(
            "/storage/{bucket}/{path}?expires_in={}",
            expires_in.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_returns_direct_children_of_prefix() {
        let store = InMemoryBlobStore::default();
        for path in ["a.png", "posts/b.png", "posts/2024/c.png"] {
            store
                .upload(
                    "media",
                    path,
                    BlobUpload {
                        bytes: Bytes::from_static(b"x"),
                        content_type: "image/png".into(),
                        upsert: false,
                        metadata: BlobMetadata::new(),
                    },
                )
                .await
                .expect("upload");
        }

        let root: Vec<_> = store
            .list("media", "")
            .await
            .expect("list")
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(root, vec!["a.png"]);

        let posts: Vec<_> = store
            .list("media", "posts")
            .await
            .expect("list")
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(posts, vec!["b.png"]);
    }

    #[tokio::test]
    async fn duplicate_slugs_are_rejected() {
        let repo = InMemoryArticles::seeded();
        let existing = repo.list_articles().await.expect("list")[0].clone();
        let err = repo
            .create_article(&NewArticle::from(&existing))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, RepoError::Rejected { status: 409, .. }));
    }
}
