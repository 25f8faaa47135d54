use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use folio::application::bridge::ContentBridge;
use folio::application::client::ContentClient;
use folio::application::fallback;
use folio::application::media::MediaService;
use folio::application::repos::{
    ArticlesRepo, BlobMetadata, BlobStore, BlobUpload, BucketSpec, ContentSource, RepoError,
};
use folio::application::storage::StorageBridge;
use folio::cache::TtlCache;
use folio::domain::entities::{
    ArticleRecord, ArticleUpdate, BatchSummary, BlobObject, NewArticle,
};
use folio::domain::types::ItemStatus;
use folio::infra::content_dir::ContentDirectory;
use folio::infra::memory::{InMemoryArticles, InMemoryBlobStore};

/// Blob store that refuses uploads to one path and otherwise delegates.
struct RejectingPath {
    inner: InMemoryBlobStore,
    path: &'static str,
}

#[async_trait]
impl BlobStore for RejectingPath {
    async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<bool, RepoError> {
        self.inner.ensure_bucket(spec).await
    }

    async fn upload(&self, bucket: &str, path: &str, upload: BlobUpload) -> Result<(), RepoError> {
        if path == self.path {
            return Err(RepoError::rejected(413, "payload too large"));
        }
        self.inner.upload(bucket, path, upload).await
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, RepoError> {
        self.inner.download(bucket, path).await
    }

    async fn metadata(&self, bucket: &str, path: &str) -> Result<BlobMetadata, RepoError> {
        self.inner.metadata(bucket, path).await
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>, RepoError> {
        self.inner.list(bucket, prefix).await
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), RepoError> {
        self.inner.remove(bucket, paths).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.inner.public_url(bucket, path)
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, RepoError> {
        self.inner.signed_url(bucket, path, expires_in).await
    }
}

/// Every call fails as if the remote were down.
struct Offline;

fn down() -> RepoError {
    RepoError::Unavailable("connection refused".into())
}

#[async_trait]
impl ArticlesRepo for Offline {
    async fn list_articles(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        Err(down())
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<ArticleRecord>, RepoError> {
        Err(down())
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<ArticleRecord>, RepoError> {
        Err(down())
    }

    async fn create_article(&self, _article: &NewArticle) -> Result<ArticleRecord, RepoError> {
        Err(down())
    }

    async fn update_article(
        &self,
        _id: &str,
        _update: &ArticleUpdate,
    ) -> Result<ArticleRecord, RepoError> {
        Err(down())
    }

    async fn delete_article(&self, _id: &str) -> Result<(), RepoError> {
        Err(down())
    }
}

#[async_trait]
impl BlobStore for Offline {
    async fn ensure_bucket(&self, _spec: &BucketSpec) -> Result<bool, RepoError> {
        Err(down())
    }

    async fn upload(&self, _: &str, _: &str, _: BlobUpload) -> Result<(), RepoError> {
        Err(down())
    }

    async fn download(&self, _: &str, _: &str) -> Result<Bytes, RepoError> {
        Err(down())
    }

    async fn metadata(&self, _: &str, _: &str) -> Result<BlobMetadata, RepoError> {
        Err(down())
    }

    async fn list(&self, _: &str, _: &str) -> Result<Vec<BlobObject>, RepoError> {
        Err(down())
    }

    async fn remove(&self, _: &str, _: &[String]) -> Result<(), RepoError> {
        Err(down())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("/offline/{bucket}/{path}")
    }

    async fn signed_url(&self, _: &str, _: &str, _: Duration) -> Result<String, RepoError> {
        Err(down())
    }
}

fn client(articles: Arc<dyn ArticlesRepo>, blobs: Arc<dyn BlobStore>) -> Arc<ContentClient> {
    let cache = Arc::new(TtlCache::new(Duration::from_secs(300)));
    Arc::new(ContentClient::new(articles, blobs, cache, true))
}

#[tokio::test]
async fn one_failing_upload_yields_exactly_one_error() {
    let blobs = Arc::new(RejectingPath {
        inner: InMemoryBlobStore::default(),
        path: "charts-that-explain-themselves.md",
    });
    let client = client(Arc::new(InMemoryArticles::seeded()), blobs);
    let storage = StorageBridge::new(client, "content", "media");

    let results = storage.migrate_all().await.expect("migrate all");
    assert_eq!(results.len(), 3);

    let summary = BatchSummary::from_results(&results);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let failed = results
        .iter()
        .find(|item| item.status == ItemStatus::Error)
        .expect("failed item");
    assert_eq!(failed.slug, "charts-that-explain-themselves");
    assert!(failed.message.contains("payload too large"));

    let stored: Vec<_> = storage
        .list_content()
        .await
        .expect("list")
        .into_iter()
        .map(|object| object.name)
        .collect();
    assert_eq!(stored, vec!["reading-game-telemetry.md", "welcome.md"]);
}

#[tokio::test]
async fn migrated_content_keeps_article_fields() {
    let client = client(
        Arc::new(InMemoryArticles::seeded()),
        Arc::new(InMemoryBlobStore::default()),
    );
    let storage = StorageBridge::new(client, "content", "media");

    let migrated = storage
        .migrate_one("sample-3")
        .await
        .expect("migrate by id");
    assert_eq!(migrated.slug, "reading-game-telemetry");
    assert!(migrated.url.is_some());

    let stored = storage
        .get_content("reading-game-telemetry")
        .await
        .expect("stored content");
    let restored = StorageBridge::from_storage_format(stored);
    let original = fallback::find_sample_article("reading-game-telemetry").expect("sample");
    assert_eq!(restored, NewArticle::from(&original));
}

#[tokio::test]
async fn outage_serves_fallback_reads_and_fails_writes() {
    let offline = Arc::new(Offline);
    let client = client(offline.clone(), offline);

    let articles = client.list_articles().await.expect("fallback list");
    assert_eq!(articles, fallback::sample_articles());

    let welcome = client.get_article("welcome").await.expect("fallback article");
    assert_eq!(welcome.id, "sample-1");
    assert!(client.get_article("missing").await.expect_err("no row").is_not_found());

    let err = client
        .create_article(NewArticle::from(&welcome))
        .await
        .expect_err("write during outage");
    assert!(err.is_unavailable());

    let storage = StorageBridge::new(client.clone(), "content", "media");
    assert!(!storage.init().await.expect("init degrades"));
    let placeholder = storage
        .get_content(fallback::PLACEHOLDER_SLUG)
        .await
        .expect("placeholder content");
    assert_eq!(placeholder.content, fallback::PLACEHOLDER_CONTENT);
    assert!(storage.list_content().await.expect("empty listing").is_empty());

    let media = MediaService::new(client, "media");
    let listed = media.list(None).await.expect("sample media");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].url, "/offline/media/sample-cover.png");
}

#[tokio::test]
async fn upload_rejects_unusable_slugs() {
    let client = client(
        Arc::new(InMemoryArticles::default()),
        Arc::new(InMemoryBlobStore::default()),
    );
    let storage = StorageBridge::new(client, "content", "media");

    let err = storage
        .upload_content("../escape", "body", BlobMetadata::new())
        .await
        .expect_err("invalid slug");
    assert!(err.is_validation());

    let err = storage
        .upload_content("fine", "", BlobMetadata::new())
        .await
        .expect_err("empty content");
    assert!(err.is_validation());
}

#[tokio::test]
async fn outage_stops_bridges_before_they_touch_anything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let handwritten = "---\ntitle: \"My own welcome\"\n---\n\nWritten by hand.\n";
    std::fs::write(dir.path().join("welcome.md"), handwritten).expect("write content file");

    let offline = Arc::new(Offline);
    let client = client(offline.clone(), offline);
    let source: Arc<dyn ContentSource> = Arc::new(ContentDirectory::new(dir.path()));
    let bridge = ContentBridge::new(client.clone(), source);

    let err = bridge.export_all().await.expect_err("export all");
    assert!(err.is_unavailable());
    let err = bridge.export("welcome").await.expect_err("export one");
    assert!(err.is_unavailable());
    let err = bridge.import_all().await.expect_err("import all");
    assert!(err.is_unavailable());
    let err = bridge.import("welcome").await.expect_err("import one");
    assert!(err.is_unavailable());
    let err = bridge.sync().await.expect_err("sync");
    assert!(err.is_unavailable());
    let err = bridge.content_mapping().await.expect_err("mapping");
    assert!(err.is_unavailable());

    let on_disk = std::fs::read_to_string(dir.path().join("welcome.md")).expect("read back");
    assert_eq!(on_disk, handwritten);
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);

    let storage = StorageBridge::new(client.clone(), "content", "media");
    let err = storage.migrate_all().await.expect_err("migrate all");
    assert!(err.is_unavailable());
    let err = storage.migrate_one("welcome").await.expect_err("migrate one");
    assert!(err.is_unavailable());

    // Plain reads keep degrading.
    assert_eq!(
        client.list_articles().await.expect("fallback list"),
        fallback::sample_articles()
    );
}

#[tokio::test]
async fn stored_content_paths_require_plain_slugs() {
    let client = client(
        Arc::new(InMemoryArticles::default()),
        Arc::new(InMemoryBlobStore::default()),
    );
    let storage = StorageBridge::new(client, "content", "media");

    let err = storage
        .get_content("../secrets")
        .await
        .expect_err("escaping get");
    assert!(err.is_validation());

    let err = storage
        .delete_content("nested/post")
        .await
        .expect_err("nested delete");
    assert!(err.is_validation());
}
