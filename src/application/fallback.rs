//! Fixed data served when the remote store cannot be reached, and used to
//! seed the in-memory backend in development mode.

use once_cell::sync::Lazy;
use time::macros::datetime;

use crate::domain::entities::{ArticleRecord, BlobObject};
use crate::domain::types::ArticleStatus;

/// Slug whose storage lookups answer with [`PLACEHOLDER_CONTENT`] when the download fails.
pub const PLACEHOLDER_SLUG: &str = "placeholder";

pub const PLACEHOLDER_CONTENT: &str =
    "# Placeholder\n\nThis content is shown while storage is unavailable.\n";

static SAMPLE_ARTICLES: Lazy<Vec<ArticleRecord>> = Lazy::new(|| {
    vec![
        ArticleRecord {
            id: "sample-3".into(),
            title: "Reading Game Telemetry".into(),
            slug: "reading-game-telemetry".into(),
            content: "## Events first\n\nStart from the raw event stream before building dashboards.\n".into(),
            description: "Turning raw play sessions into questions worth asking.".into(),
            cover_image: String::new(),
            tags: vec!["data".into(), "games".into()],
            status: ArticleStatus::Published,
            author_name: "Admin".into(),
            created_at: datetime!(2024-03-12 09:00 UTC),
            updated_at: datetime!(2024-03-12 09:00 UTC),
        },
        ArticleRecord {
            id: "sample-2".into(),
            title: "Charts That Explain Themselves".into(),
            slug: "charts-that-explain-themselves".into(),
            content: "Label the axes, then label them again.\n".into(),
            description: "Small habits for clearer visualisations.".into(),
            cover_image: String::new(),
            tags: vec!["visualisation".into()],
            status: ArticleStatus::Published,
            author_name: "Admin".into(),
            created_at: datetime!(2024-02-02 12:30 UTC),
            updated_at: datetime!(2024-02-20 08:15 UTC),
        },
        ArticleRecord {
            id: "sample-1".into(),
            title: "Welcome".into(),
            slug: "welcome".into(),
            content: "# Welcome\n\nThis blog collects notes on data and play.\n".into(),
            description: "What this blog is about.".into(),
            cover_image: String::new(),
            tags: Vec::new(),
            status: ArticleStatus::Published,
            author_name: "Admin".into(),
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        },
    ]
});

static SAMPLE_MEDIA: Lazy<Vec<BlobObject>> = Lazy::new(|| {
    vec![
        BlobObject {
            name: "sample-cover.png".into(),
            id: Some("sample-media-1".into()),
            created_at: Some("2024-01-01T00:00:00Z".into()),
            updated_at: None,
            metadata: None,
        },
        BlobObject {
            name: "sample-chart.svg".into(),
            id: Some("sample-media-2".into()),
            created_at: Some("2024-02-02T12:30:00Z".into()),
            updated_at: None,
            metadata: None,
        },
    ]
});

/// Sample articles, newest first.
pub fn sample_articles() -> Vec<ArticleRecord> {
    SAMPLE_ARTICLES.clone()
}

/// Sample article matching `key` as id, then as slug.
pub fn find_sample_article(key: &str) -> Option<ArticleRecord> {
    SAMPLE_ARTICLES
        .iter()
        .find(|article| article.id == key)
        .or_else(|| SAMPLE_ARTICLES.iter().find(|article| article.slug == key))
        .cloned()
}

pub fn sample_media() -> Vec<BlobObject> {
    SAMPLE_MEDIA.clone()
}
