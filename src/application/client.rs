//! Cache-aware access to the remote article store and object storage.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

use crate::application::error::AppError;
use crate::application::fallback;
use crate::application::repos::{
    ArticlesRepo, BlobMetadata, BlobStore, BlobUpload, BucketSpec, RepoError,
};
use crate::cache::TtlCache;
use crate::domain::entities::{ArticleRecord, ArticleUpdate, BlobObject, NewArticle};

const LIST_KEY: &str = "articles:list";

fn article_key(id_or_slug: &str) -> String {
    format!("articles:get:{id_or_slug}")
}

/// Values memoised by [`ContentClient`].
#[derive(Debug, Clone)]
pub enum CachedRead {
    Articles(Arc<Vec<ArticleRecord>>),
    Article(Arc<ArticleRecord>),
}

/// Single entry point for remote reads and writes.
///
/// Article reads go through the TTL cache; every article mutation clears the
/// whole cache before returning, whether or not the remote call succeeded.
/// When `degrade_reads` is set, reads that hit an unreachable remote answer
/// with the fixed fallback data instead of failing. Degraded answers are
/// never cached, and writes always propagate the outage. The `_strict` reads
/// ignore `degrade_reads`; the bridges use them so sample data is never
/// written anywhere.
pub struct ContentClient {
    articles: Arc<dyn ArticlesRepo>,
    blobs: Arc<dyn BlobStore>,
    cache: Arc<TtlCache<CachedRead>>,
    degrade_reads: bool,
}

impl ContentClient {
    pub fn new(
        articles: Arc<dyn ArticlesRepo>,
        blobs: Arc<dyn BlobStore>,
        cache: Arc<TtlCache<CachedRead>>,
        degrade_reads: bool,
    ) -> Self {
        Self {
            articles,
            blobs,
            cache,
            degrade_reads,
        }
    }

    /// All articles, newest first.
    pub async fn list_articles(&self) -> Result<Vec<ArticleRecord>, AppError> {
        self.read_articles(self.degrade_reads).await
    }

    /// Like [`list_articles`](Self::list_articles), but an unreachable remote
    /// is always an error. Anything that writes based on the listing uses this.
    pub async fn list_articles_strict(&self) -> Result<Vec<ArticleRecord>, AppError> {
        self.read_articles(false).await
    }

    /// Look an article up by id, then by slug.
    pub async fn get_article(&self, id_or_slug: &str) -> Result<ArticleRecord, AppError> {
        self.read_article(id_or_slug, self.degrade_reads).await
    }

    /// Like [`get_article`](Self::get_article), but never answers with sample data.
    pub async fn get_article_strict(&self, id_or_slug: &str) -> Result<ArticleRecord, AppError> {
        self.read_article(id_or_slug, false).await
    }

    async fn read_articles(&self, degrade: bool) -> Result<Vec<ArticleRecord>, AppError> {
        if let Some(CachedRead::Articles(articles)) = self.cache.get(LIST_KEY) {
            return Ok(articles.as_ref().clone());
        }

        match self.articles.list_articles().await {
            Ok(articles) => {
                self.cache
                    .set(LIST_KEY, CachedRead::Articles(Arc::new(articles.clone())));
                Ok(articles)
            }
            Err(RepoError::Unavailable(reason)) if degrade => {
                warn!(
                    target: "folio::client",
                    op = "list_articles",
                    reason = %reason,
                    "remote unavailable; serving fallback articles"
                );
                Ok(fallback::sample_articles())
            }
            Err(err) => Err(AppError::from_repo("articles", "*")(err)),
        }
    }

    async fn read_article(
        &self,
        id_or_slug: &str,
        degrade: bool,
    ) -> Result<ArticleRecord, AppError> {
        let key = article_key(id_or_slug);
        if let Some(CachedRead::Article(article)) = self.cache.get(&key) {
            return Ok(article.as_ref().clone());
        }

        match self.lookup(id_or_slug).await {
            Ok(Some(article)) => {
                self.cache
                    .set(key, CachedRead::Article(Arc::new(article.clone())));
                Ok(article)
            }
            Ok(None) => Err(AppError::not_found("article", id_or_slug)),
            Err(RepoError::Unavailable(reason)) if degrade => {
                warn!(
                    target: "folio::client",
                    op = "get_article",
                    key = id_or_slug,
                    reason = %reason,
                    "remote unavailable; serving fallback article"
                );
                fallback::find_sample_article(id_or_slug)
                    .ok_or_else(|| AppError::not_found("article", id_or_slug))
            }
            Err(err) => Err(AppError::from_repo("article", id_or_slug)(err)),
        }
    }

    async fn lookup(&self, id_or_slug: &str) -> Result<Option<ArticleRecord>, RepoError> {
        if let Some(article) = self.articles.find_by_id(id_or_slug).await? {
            return Ok(Some(article));
        }
        self.articles.find_by_slug(id_or_slug).await
    }

    pub async fn create_article(&self, article: NewArticle) -> Result<ArticleRecord, AppError> {
        article.validate()?;

        let result = self.articles.create_article(&article).await;
        self.cache.clear();

        let created = result.map_err(AppError::from_repo("article", &article.slug))?;
        info!(
            target: "folio::client",
            op = "create_article",
            id = %created.id,
            slug = %created.slug,
            "article created"
        );
        Ok(created)
    }

    pub async fn update_article(
        &self,
        id: &str,
        update: ArticleUpdate,
    ) -> Result<ArticleRecord, AppError> {
        let result = self.articles.update_article(id, &update).await;
        self.cache.clear();
        result.map_err(AppError::from_repo("article", id))
    }

    pub async fn delete_article(&self, id: &str) -> Result<(), AppError> {
        let result = self.articles.delete_article(id).await;
        self.cache.clear();
        result.map_err(AppError::from_repo("article", id))
    }

    pub async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<bool, AppError> {
        self.blobs
            .ensure_bucket(spec)
            .await
            .map_err(AppError::from_repo("bucket", &spec.name))
    }

    pub async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        upload: BlobUpload,
    ) -> Result<(), AppError> {
        self.blobs
            .upload(bucket, path, upload)
            .await
            .map_err(AppError::from_repo("object", path))
    }

    pub async fn download_blob(&self, bucket: &str, path: &str) -> Result<Bytes, AppError> {
        self.blobs
            .download(bucket, path)
            .await
            .map_err(AppError::from_repo("object", path))
    }

    pub async fn blob_metadata(&self, bucket: &str, path: &str) -> Result<BlobMetadata, AppError> {
        self.blobs
            .metadata(bucket, path)
            .await
            .map_err(AppError::from_repo("object", path))
    }

    /// Objects under `prefix`; an unreachable remote yields an empty list.
    pub async fn list_blobs(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>, AppError> {
        self.list_blobs_or(bucket, prefix, Vec::new).await
    }

    /// Objects under `prefix`; an unreachable remote yields `fallback()`.
    pub async fn list_blobs_or(
        &self,
        bucket: &str,
        prefix: &str,
        fallback: impl FnOnce() -> Vec<BlobObject>,
    ) -> Result<Vec<BlobObject>, AppError> {
        match self.blobs.list(bucket, prefix).await {
            Ok(objects) => Ok(objects),
            Err(RepoError::Unavailable(reason)) if self.degrade_reads => {
                warn!(
                    target: "folio::client",
                    op = "list_blobs",
                    bucket,
                    prefix,
                    reason = %reason,
                    "remote unavailable; serving fallback listing"
                );
                Ok(fallback())
            }
            Err(err) => Err(AppError::from_repo("bucket", bucket)(err)),
        }
    }

    pub async fn delete_blobs(&self, bucket: &str, paths: &[String]) -> Result<(), AppError> {
        let key = paths.join(",");
        self.blobs
            .remove(bucket, paths)
            .await
            .map_err(AppError::from_repo("object", &key))
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.blobs.public_url(bucket, path)
    }

    pub async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, AppError> {
        self.blobs
            .signed_url(bucket, path, expires_in)
            .await
            .map_err(AppError::from_repo("object", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::domain::types::ArticleStatus;
    use crate::infra::memory::{InMemoryArticles, InMemoryBlobStore};

    fn client(ttl: Duration) -> (ContentClient, Arc<InMemoryArticles>, ManualClock) {
        let clock = ManualClock::new();
        let articles = Arc::new(InMemoryArticles::default());
        let cache = Arc::new(TtlCache::with_clock(ttl, Arc::new(clock.clone())));
        let client = ContentClient::new(
            articles.clone(),
            Arc::new(InMemoryBlobStore::default()),
            cache,
            true,
        );
        (client, articles, clock)
    }

    fn new_article(slug: &str) -> NewArticle {
        NewArticle {
            title: format!("Title {slug}"),
            slug: slug.to_string(),
            content: "Body".into(),
            description: String::new(),
            cover_image: String::new(),
            tags: Vec::new(),
            status: ArticleStatus::Published,
            author_name: "Admin".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn dual_key_lookup_tries_id_then_slug() {
        let (client, _, _) = client(Duration::from_secs(300));
        let created = client
            .create_article(new_article("dual-key"))
            .await
            .expect("create");

        let by_id = client.get_article(&created.id).await.expect("by id");
        let by_slug = client.get_article("dual-key").await.expect("by slug");
        assert_eq!(by_id, by_slug);

        let missing = client.get_article("nope").await.expect_err("missing");
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn mutations_are_visible_immediately() {
        let (client, _, _) = client(Duration::from_secs(300));
        assert!(client.list_articles().await.expect("list").is_empty());

        let created = client
            .create_article(new_article("fresh"))
            .await
            .expect("create");
        assert_eq!(client.list_articles().await.expect("list").len(), 1);

        client
            .update_article(
                &created.id,
                ArticleUpdate {
                    title: Some("Renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(
            client.list_articles().await.expect("list")[0].title,
            "Renamed"
        );

        client.delete_article(&created.id).await.expect("delete");
        assert!(client.list_articles().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn reads_are_served_from_cache_within_ttl() {
        let (client, articles, clock) = client(Duration::from_secs(300));
        client
            .create_article(new_article("cached"))
            .await
            .expect("create");
        assert_eq!(client.list_articles().await.expect("list").len(), 1);

        // Bypass the client so the cache is not cleared.
        articles
            .create_article(&new_article("behind-the-back"))
            .await
            .expect("direct insert");
        assert_eq!(client.list_articles().await.expect("list").len(), 1);

        clock.advance(Duration::from_secs(300));
        assert_eq!(client.list_articles().await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_missing_title() {
        let (client, _, _) = client(Duration::from_secs(300));
        let mut article = new_article("untitled");
        article.title = String::new();

        let err = client.create_article(article).await.expect_err("invalid");
        assert!(err.is_validation());
    }
}
