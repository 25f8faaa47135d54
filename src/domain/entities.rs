//! Domain entities mirrored from the article store, the content directory and
//! object storage.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::domain::{
    error::DomainError,
    frontmatter::Frontmatter,
    slug::is_valid_slug,
    types::{ArticleStatus, ContentFormat, ItemStatus, MappingSource},
};

/// Article row as stored remotely. `id` is store-local; `slug` is the join key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cover_image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Writable fields for a new article row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub description: String,
    pub cover_image: String,
    pub tags: Vec<String>,
    pub status: ArticleStatus,
    pub author_name: String,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl NewArticle {
    /// Check the fields the article store requires on insert.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("article title is required"));
        }
        if self.slug.trim().is_empty() {
            return Err(DomainError::validation("article slug is required"));
        }
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::validation(format!(
                "article slug `{}` is not URL-safe",
                self.slug
            )));
        }
        Ok(())
    }
}

impl From<&ArticleRecord> for NewArticle {
    fn from(article: &ArticleRecord) -> Self {
        Self {
            title: article.title.clone(),
            slug: article.slug.clone(),
            content: article.content.clone(),
            description: article.description.clone(),
            cover_image: article.cover_image.clone(),
            tags: article.tags.clone(),
            status: article.status,
            author_name: article.author_name.clone(),
            created_at: Some(article.created_at),
            updated_at: Some(article.updated_at),
        }
    }
}

/// Partial update; absent fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl ArticleUpdate {
    /// Apply the present fields onto an existing record.
    pub fn apply_to(&self, article: &mut ArticleRecord) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(slug) = &self.slug {
            article.slug = slug.clone();
        }
        if let Some(content) = &self.content {
            article.content = content.clone();
        }
        if let Some(description) = &self.description {
            article.description = description.clone();
        }
        if let Some(cover_image) = &self.cover_image {
            article.cover_image = cover_image.clone();
        }
        if let Some(tags) = &self.tags {
            article.tags = tags.clone();
        }
        if let Some(status) = self.status {
            article.status = status;
        }
        if let Some(author_name) = &self.author_name {
            article.author_name = author_name.clone();
        }
        if let Some(updated_at) = self.updated_at {
            article.updated_at = updated_at;
        }
    }
}

/// A markdown file from the content directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFileEntry {
    /// File name relative to the content directory, e.g. `getting-started.md`.
    pub id: String,
    pub slug: String,
    pub format: ContentFormat,
    pub frontmatter: Frontmatter,
    pub body: String,
}

const DEFAULT_AUTHOR: &str = "Admin";

impl ContentFileEntry {
    /// Project the file onto a new database row.
    ///
    /// Imported files are published; a missing author becomes `Admin` and
    /// missing dates become `now`.
    pub fn to_new_article(&self, now: OffsetDateTime) -> NewArticle {
        let frontmatter = &self.frontmatter;
        NewArticle {
            title: frontmatter.title.clone(),
            slug: self.slug.clone(),
            content: self.body.clone(),
            description: frontmatter.description.clone().unwrap_or_default(),
            cover_image: frontmatter.cover_image.clone().unwrap_or_default(),
            tags: frontmatter.tags.clone(),
            status: ArticleStatus::Published,
            author_name: frontmatter
                .author
                .as_ref()
                .map(|author| author.name.clone())
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            created_at: Some(frontmatter.pub_date.unwrap_or(now)),
            updated_at: Some(frontmatter.updated_date.unwrap_or(now)),
        }
    }
}

/// Presence of one slug across the content directory and the article store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMappingEntry {
    pub content_id: Option<String>,
    pub db_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub source: MappingSource,
}

/// Per-item result of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemResult {
    pub slug: String,
    pub status: ItemStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl BatchItemResult {
    pub fn success(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: ItemStatus::Success,
            message: message.into(),
            path: None,
        }
    }

    pub fn skipped(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: ItemStatus::Skipped,
            message: message.into(),
            path: None,
        }
    }

    pub fn error(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: ItemStatus::Error,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Counts over a batch; `failed > 0` is a partial failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchItemResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, item| {
                match item.status {
                    ItemStatus::Success => summary.succeeded += 1,
                    ItemStatus::Skipped => summary.skipped += 1,
                    ItemStatus::Error => summary.failed += 1,
                }
                summary
            })
    }

    pub fn is_partial_failure(&self) -> bool {
        self.failed > 0
    }
}

/// Object listed from a storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobObject {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Media asset with a resolved public URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaObject {
    pub name: String,
    pub path: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn article_decodes_numeric_ids_and_null_columns() {
        let article: ArticleRecord = serde_json::from_value(json!({
            "id": 42,
            "title": "Hello",
            "slug": "hello",
            "content": null,
            "description": null,
            "cover_image": null,
            "tags": null,
            "status": "published",
            "author_name": null,
            "created_at": "2025-02-10T00:00:00+00:00",
            "updated_at": "2025-02-10T08:30:00.123456+00:00",
            "featured": true
        }))
        .expect("decode article");

        assert_eq!(article.id, "42");
        assert!(article.content.is_empty());
        assert!(article.tags.is_empty());
        assert_eq!(article.status, ArticleStatus::Published);
    }

    #[test]
    fn new_article_requires_title_and_safe_slug() {
        let mut article = NewArticle {
            title: String::new(),
            slug: "hello".into(),
            content: String::new(),
            description: String::new(),
            cover_image: String::new(),
            tags: Vec::new(),
            status: ArticleStatus::Draft,
            author_name: String::new(),
            created_at: None,
            updated_at: None,
        };
        assert!(article.validate().is_err());

        article.title = "Hello".into();
        assert!(article.validate().is_ok());

        article.slug = "../etc".into();
        assert!(article.validate().is_err());
    }

    #[test]
    fn update_serializes_only_present_fields() {
        let update = ArticleUpdate {
            title: Some("New".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).expect("encode");
        assert_eq!(value, json!({ "title": "New" }));
    }

    #[test]
    fn content_entry_projects_with_defaults() {
        use crate::domain::frontmatter::Frontmatter;
        use time::macros::datetime;

        let entry = ContentFileEntry {
            id: "getting-started.md".into(),
            slug: "getting-started".into(),
            format: ContentFormat::Md,
            frontmatter: Frontmatter {
                title: "Getting Started".into(),
                pub_date: Some(datetime!(2024-01-01 0:00 UTC)),
                ..Default::default()
            },
            body: "# Hi".into(),
        };
        let now = datetime!(2025-06-01 12:00 UTC);
        let article = entry.to_new_article(now);

        assert_eq!(article.status, ArticleStatus::Published);
        assert_eq!(article.author_name, "Admin");
        assert_eq!(article.created_at, Some(datetime!(2024-01-01 0:00 UTC)));
        assert_eq!(article.updated_at, Some(now));
        assert!(article.validate().is_ok());
    }

    #[test]
    fn summary_counts_each_status() {
        let results = vec![
            BatchItemResult::success("a", "ok"),
            BatchItemResult::skipped("b", "exists"),
            BatchItemResult::error("c", "boom"),
        ];
        let summary = BatchSummary::from_results(&results);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.is_partial_failure());
    }
}
