use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio::application::bridge::{ContentBridge, ImportOutcome};
use folio::application::client::ContentClient;
use folio::application::fallback;
use folio::application::repos::{ArticlesRepo, BlobStore, ContentSource, RepoError};
use folio::cache::{ManualClock, TtlCache};
use folio::domain::entities::{ArticleRecord, ArticleUpdate, BatchSummary, NewArticle};
use folio::domain::types::{ContentFormat, ItemStatus, MappingSource};
use folio::infra::content_dir::ContentDirectory;
use folio::infra::memory::{InMemoryArticles, InMemoryBlobStore};

struct Fixture {
    bridge: ContentBridge,
    client: Arc<ContentClient>,
    articles: Arc<InMemoryArticles>,
}

fn client_over(repo: Arc<dyn ArticlesRepo>) -> Arc<ContentClient> {
    let blobs: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::default());
    let cache = Arc::new(TtlCache::with_clock(
        Duration::from_secs(300),
        Arc::new(ManualClock::default()),
    ));
    Arc::new(ContentClient::new(repo, blobs, cache, true))
}

fn fixture(dir: &Path, articles: InMemoryArticles) -> Fixture {
    let articles = Arc::new(articles);
    let repo: Arc<dyn ArticlesRepo> = articles.clone();
    let client = client_over(repo);
    let source: Arc<dyn ContentSource> = Arc::new(ContentDirectory::new(dir));

    Fixture {
        bridge: ContentBridge::new(client.clone(), source),
        client,
        articles,
    }
}

/// Article table that refuses to create one slug and otherwise delegates.
struct RefusingSlug {
    inner: InMemoryArticles,
    slug: &'static str,
}

#[async_trait]
impl ArticlesRepo for RefusingSlug {
    async fn list_articles(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        self.inner.list_articles().await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArticleRecord>, RepoError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>, RepoError> {
        self.inner.find_by_slug(slug).await
    }

    async fn create_article(&self, article: &NewArticle) -> Result<ArticleRecord, RepoError> {
        if article.slug == self.slug {
            return Err(RepoError::rejected(
                409,
                "duplicate key value violates unique constraint",
            ));
        }
        self.inner.create_article(article).await
    }

    async fn update_article(
        &self,
        id: &str,
        update: &ArticleUpdate,
    ) -> Result<ArticleRecord, RepoError> {
        self.inner.update_article(id, update).await
    }

    async fn delete_article(&self, id: &str) -> Result<(), RepoError> {
        self.inner.delete_article(id).await
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write content file");
}

#[tokio::test]
async fn content_only_slug_reports_content_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "getting-started.md",
        "---\ntitle: \"Getting Started\"\npubDate: 2024-01-01\n---\n\nHello.\n",
    );
    let fx = fixture(dir.path(), InMemoryArticles::default());

    let mapping = fx.bridge.content_mapping().await.expect("mapping");
    assert_eq!(mapping.len(), 1);
    let entry = &mapping["getting-started"];
    assert_eq!(entry.source, MappingSource::Content);
    assert_eq!(entry.db_id, None);
    assert_eq!(entry.title, "Getting Started");
}

#[tokio::test]
async fn import_projects_frontmatter_onto_new_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "field-notes.md",
        concat!(
            "---\n",
            "title: \"Field Notes\"\n",
            "description: \"Notes from the field\"\n",
            "pubDate: 2024-05-01\n",
            "updatedDate: 2024-05-03\n",
            "coverImage: \"/media/cover.png\"\n",
            "author:\n",
            "  name: \"Grace\"\n",
            "tags: [\"research\", \"notes\"]\n",
            "---\n",
            "\n",
            "Body.\n",
        ),
    );
    let fx = fixture(dir.path(), InMemoryArticles::default());

    let outcome = fx.bridge.import("field-notes").await.expect("import");
    let ImportOutcome::Imported { article } = outcome else {
        panic!("expected a new row, got {outcome:?}");
    };
    assert_eq!(article.title, "Field Notes");
    assert_eq!(article.description, "Notes from the field");
    assert_eq!(article.cover_image, "/media/cover.png");
    assert_eq!(article.author_name, "Grace");
    assert_eq!(article.tags, vec!["research", "notes"]);
    assert_eq!(article.content, "Body.\n");
    assert_eq!(
        folio::domain::frontmatter::format_content_date(article.created_at),
        "2024-05-01"
    );
    assert_eq!(
        folio::domain::frontmatter::format_content_date(article.updated_at),
        "2024-05-03"
    );

    let mapping = fx.bridge.content_mapping().await.expect("mapping");
    assert_eq!(mapping["field-notes"].source, MappingSource::Both);
}

#[tokio::test]
async fn second_import_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "twice.md", "---\ntitle: Twice\n---\nx");
    let fx = fixture(dir.path(), InMemoryArticles::default());

    fx.bridge.import("twice").await.expect("first import");
    let outcome = fx.bridge.import("twice").await.expect("second import");
    assert!(matches!(outcome, ImportOutcome::Skipped { .. }));
    assert_eq!(fx.articles.list_articles().await.expect("rows").len(), 1);
}

#[tokio::test]
async fn database_only_slug_becomes_both_after_export() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fx = fixture(dir.path(), InMemoryArticles::seeded());

    let before = fx.bridge.content_mapping().await.expect("mapping");
    assert_eq!(before["welcome"].source, MappingSource::Database);

    let exported = fx.bridge.export("welcome").await.expect("export");
    assert_eq!(exported.format, ContentFormat::Md);

    let after = fx.bridge.content_mapping().await.expect("mapping");
    assert_eq!(after["welcome"].source, MappingSource::Both);
    assert_eq!(after["welcome"].content_id.as_deref(), Some("welcome.md"));
}

#[tokio::test]
async fn exported_document_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fx = fixture(dir.path(), InMemoryArticles::seeded());

    fx.bridge
        .export("charts-that-explain-themselves")
        .await
        .expect("export");
    let document = std::fs::read_to_string(dir.path().join("charts-that-explain-themselves.md"))
        .expect("read exported file");

    insta::assert_snapshot!(document, @r#"
    ---
    title: "Charts That Explain Themselves"
    description: "Small habits for clearer visualisations."
    pubDate: "2024-02-02"
    updatedDate: "2024-02-20"
    author:
      name: "Admin"
    tags: ["visualisation"]
    ---

    Label the axes, then label them again.
    "#);
}

#[tokio::test]
async fn export_switches_extension_for_component_bodies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fx = fixture(dir.path(), InMemoryArticles::seeded());

    fx.bridge.export("welcome").await.expect("plain export");
    assert!(dir.path().join("welcome.md").exists());

    let welcome = fx.client.get_article("welcome").await.expect("row");
    fx.client
        .update_article(
            &welcome.id,
            ArticleUpdate {
                content: Some("import Chart from './Chart.astro';\n\n<Chart />\n".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    let exported = fx.bridge.export("welcome").await.expect("mdx export");
    assert_eq!(exported.format, ContentFormat::Mdx);
    assert!(dir.path().join("welcome.mdx").exists());
    assert!(!dir.path().join("welcome.md").exists());
}

#[tokio::test]
async fn export_all_writes_every_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fx = fixture(dir.path(), InMemoryArticles::seeded());

    let results = fx.bridge.export_all().await.expect("export all");
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|item| item.status == ItemStatus::Success));
    assert!(results.iter().all(|item| item.path.is_some()));

    let entries = fx.bridge.all_articles().await.expect("mapping");
    assert!(entries.iter().all(|entry| entry.source == MappingSource::Both));
}

#[tokio::test]
async fn sync_only_creates_missing_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "welcome.md", "---\ntitle: Welcome again\n---\nx");
    write(dir.path(), "fresh.md", "---\ntitle: Fresh\n---\ny");
    let fx = fixture(dir.path(), InMemoryArticles::seeded());

    let summary = fx.bridge.sync().await.expect("sync");
    assert_eq!(summary.synced, 1);
    assert_eq!(summary.message, "Synced 1 content files to database");

    let rows = fx.articles.list_articles().await.expect("rows");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.iter().filter(|row| row.slug == "welcome").count(), 1);
}

#[tokio::test]
async fn mutations_are_visible_within_ttl() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fx = fixture(dir.path(), InMemoryArticles::seeded());

    assert_eq!(fx.client.list_articles().await.expect("list").len(), 3);

    write(dir.path(), "late.md", "---\ntitle: Late\n---\nbody");
    fx.bridge.import("late").await.expect("import");
    let rows = fx.client.list_articles().await.expect("list");
    assert!(rows.iter().any(|row| row.slug == "late"));

    let late = rows
        .into_iter()
        .find(|row| row.slug == "late")
        .expect("late row");
    fx.client.delete_article(&late.id).await.expect("delete");
    let rows = fx.client.list_articles().await.expect("list");
    assert!(rows.iter().all(|row| row.slug != "late"));
}

#[tokio::test]
async fn import_all_records_one_rejected_create() {
    let dir = tempfile::tempdir().expect("tempdir");
    for slug in ["alpha", "beta", "gamma"] {
        write(dir.path(), &format!("{slug}.md"), &format!("---\ntitle: {slug}\n---\nbody"));
    }
    let repo = Arc::new(RefusingSlug {
        inner: InMemoryArticles::default(),
        slug: "beta",
    });
    let source: Arc<dyn ContentSource> = Arc::new(ContentDirectory::new(dir.path()));
    let bridge = ContentBridge::new(client_over(repo.clone()), source);

    let results = bridge.import_all().await.expect("import all");
    assert_eq!(results.len(), 3);
    let summary = BatchSummary::from_results(&results);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let failed = results
        .iter()
        .find(|item| item.status == ItemStatus::Error)
        .expect("failed item");
    assert_eq!(failed.slug, "beta");
    assert!(failed.message.contains("409"));

    let rows = repo.list_articles().await.expect("rows");
    let mut slugs: Vec<_> = rows.iter().map(|row| row.slug.as_str()).collect();
    slugs.sort_unstable();
    assert_eq!(slugs, vec!["alpha", "gamma"]);
}

#[tokio::test]
async fn export_all_records_one_failed_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory where the file should go makes that one write fail.
    std::fs::create_dir(dir.path().join("welcome.md")).expect("blocking dir");
    let fx = fixture(dir.path(), InMemoryArticles::seeded());

    let results = fx.bridge.export_all().await.expect("export all");
    assert_eq!(results.len(), 3);
    let summary = BatchSummary::from_results(&results);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let failed = results
        .iter()
        .find(|item| item.status == ItemStatus::Error)
        .expect("failed item");
    assert_eq!(failed.slug, "welcome");
    assert!(dir.path().join("reading-game-telemetry.md").exists());
    assert!(dir.path().join("charts-that-explain-themselves.md").exists());
}

#[tokio::test]
async fn rows_with_path_like_slugs_are_not_exported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("blog");
    let mut rows = fallback::sample_articles();
    let mut escaping = rows[0].clone();
    escaping.id = "foreign-1".into();
    escaping.slug = "../escaped".into();
    rows.push(escaping);
    let fx = fixture(&root, InMemoryArticles::with_rows(rows));

    let err = fx.bridge.export("../escaped").await.expect_err("escaping export");
    assert!(err.is_validation());
    assert!(!dir.path().join("escaped.md").exists());

    let results = fx.bridge.export_all().await.expect("export all");
    assert_eq!(results.len(), 4);
    let failed: Vec<_> = results
        .iter()
        .filter(|item| item.status == ItemStatus::Error)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].slug, "../escaped");
    assert!(!dir.path().join("escaped.md").exists());
    assert!(root.join("welcome.md").exists());
}
